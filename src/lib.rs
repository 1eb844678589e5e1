//! A FreeCell solver: a board model with O(1) move undo, a legal move
//! generator with priority ordering and redundancy filtering, and a
//! depth-limited backtracking search with visited-state pruning.
pub mod board;
pub mod card;
pub mod moves;
pub mod solver;
pub mod stack;

pub use crate::board::{Board, Fingerprint};
pub use crate::card::{Card, Color, Suit};
pub use crate::moves::{Move, MoveRules};
pub use crate::solver::{SolveResult, Solver, SolverConfig, search};
pub use crate::stack::{Stack, StackId, StackKind};
