//! Depth-limited backtracking search over a [`Board`].
//!
//! The search mutates the board in place: every move it tries is undone before
//! the next sibling is tried, unless it led to a solved board. A session owns
//! its visited-state table, so independent searches never share state.

mod random_walk;
mod visited;

pub use self::random_walk::{WalkConfig, WalkResult, random_walk};
pub use self::visited::RevisitPolicy;

use self::visited::{Visit, VisitedStates};

use crate::{
    board::Board,
    moves::{MoveRules, PossibleMoves, candidate_moves},
};

use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};
use tracing::{debug, info, trace};

pub const DEFAULT_DEPTH_LIMIT: i32 = 200;

const PROGRESS_CHECK_EVERY: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum number of further moves the search may attempt from the root.
    pub depth_limit: i32,
    pub rules: MoveRules,
    pub revisit: RevisitPolicy,
    pub progress_interval: Duration,
    /// Gives up once the visited table holds this many boards.
    pub max_states: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            depth_limit: DEFAULT_DEPTH_LIMIT,
            rules: MoveRules::default(),
            revisit: RevisitPolicy::default(),
            progress_interval: Duration::from_secs(1),
            max_states: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveResult {
    pub solved: bool,
    /// The search stopped early because `max_states` was reached.
    pub exhausted: bool,
    /// Distinct boards entered into the visited table.
    pub states: usize,
    /// Boards whose candidate moves were generated.
    pub expanded: u64,
    /// Moves that led to an already visited board.
    pub pruned: u64,
    pub elapsed: Duration,
    /// How far back in discovery order each pruned board had been seen.
    pub lookback_histogram: BTreeMap<usize, u64>,
}

/// Searches `board` for a solution within `depth_limit` moves using default settings.
pub fn search(board: &mut Board, depth_limit: i32) -> SolveResult {
    Solver::new(SolverConfig {
        depth_limit,
        ..Default::default()
    })
    .search(board)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Solved,
    Failed,
    Exhausted,
}

struct Frame {
    moves: PossibleMoves,
    next: usize,
    depth_remaining: i32,
    applied: bool,
}

impl Frame {
    fn new(board: &Board, rules: MoveRules, depth_remaining: i32) -> Self {
        Self {
            moves: candidate_moves(board, rules),
            next: 0,
            depth_remaining,
            applied: false,
        }
    }
}

#[derive(Debug)]
pub struct Solver {
    config: SolverConfig,
    visited: VisitedStates,
    lookback_histogram: BTreeMap<usize, u64>,
    expanded: u64,
    pruned: u64,
    next_progress: Instant,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            visited: VisitedStates::new(config.revisit),
            lookback_histogram: BTreeMap::new(),
            expanded: 0,
            pruned: 0,
            next_progress: Instant::now(),
        }
    }

    /// Runs one search session. On success the board is left solved with the
    /// winning line in its history; otherwise it is restored to its entry state.
    pub fn search(&mut self, board: &mut Board) -> SolveResult {
        self.reset();
        let timer = Instant::now();
        info!(
            depth_limit = self.config.depth_limit,
            "Searching for a solution"
        );

        let outcome = if board.is_solved() {
            Outcome::Solved
        } else {
            self.run(board)
        };

        let result = SolveResult {
            solved: outcome == Outcome::Solved,
            exhausted: outcome == Outcome::Exhausted,
            states: self.visited.len(),
            expanded: self.expanded,
            pruned: self.pruned,
            elapsed: timer.elapsed(),
            lookback_histogram: std::mem::take(&mut self.lookback_histogram),
        };
        info!(
            solved = result.solved,
            exhausted = result.exhausted,
            states = result.states,
            pruned = result.pruned,
            moves = board.move_count(),
            "Search finished in {:?}",
            result.elapsed
        );
        result
    }

    fn reset(&mut self) {
        self.visited = VisitedStates::new(self.config.revisit);
        self.lookback_histogram.clear();
        self.expanded = 0;
        self.pruned = 0;
        self.next_progress = Instant::now() + self.config.progress_interval;
    }

    fn run(&mut self, board: &mut Board) -> Outcome {
        if self.config.depth_limit < 0 {
            return Outcome::Failed;
        }
        let mut frames = vec![self.expand(board, self.config.depth_limit)];

        while let Some(frame) = frames.last_mut() {
            if frame.applied {
                board.undo_last_move();
                frame.applied = false;
            }
            let Some(&mov) = frame.moves.get(frame.next) else {
                frames.pop();
                continue;
            };
            frame.next += 1;
            let depth_remaining = frame.depth_remaining;

            board.apply_move(mov);
            trace!(depth_remaining, "Trying {mov}");
            if board.is_solved() {
                return Outcome::Solved;
            }

            match self.visited.visit(board.fingerprint(), depth_remaining - 1) {
                Visit::Seen { lookback } => {
                    self.pruned += 1;
                    *self.lookback_histogram.entry(lookback).or_default() += 1;
                    board.undo_last_move();
                }
                Visit::New => {
                    frame.applied = true;
                    if self.out_of_states() {
                        debug!(states = self.visited.len(), "State budget reached");
                        unwind(board, &frames);
                        return Outcome::Exhausted;
                    }
                    if depth_remaining > 0 {
                        frames.push(self.expand(board, depth_remaining - 1));
                    }
                }
            }
        }

        Outcome::Failed
    }

    fn out_of_states(&self) -> bool {
        self.config
            .max_states
            .is_some_and(|max| self.visited.len() >= max)
    }

    fn expand(&mut self, board: &Board, depth_remaining: i32) -> Frame {
        self.expanded += 1;
        if self.expanded % PROGRESS_CHECK_EVERY == 0 {
            self.report_progress(board, depth_remaining);
        }
        Frame::new(board, self.config.rules, depth_remaining)
    }

    fn report_progress(&mut self, board: &Board, depth_remaining: i32) {
        let now = Instant::now();
        if now < self.next_progress {
            return;
        }
        self.next_progress = now + self.config.progress_interval;
        debug!(
            depth_remaining,
            states = self.visited.len(),
            pruned = self.pruned,
            line = board.move_count(),
            "Search progress"
        );
        trace!("\n{}", board.to_layout_string());
    }
}

/// Undoes the move each frame still has applied, deepest first.
fn unwind(board: &mut Board, frames: &[Frame]) {
    let applied = frames.iter().filter(|frame| frame.applied).count();
    for _ in 0..applied {
        board.undo_last_move();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::{TEST_GAME, kings_left_board};
    use crate::card::{Card, Suit};
    use crate::stack::StackKind;

    /// Hearts stop at the Jack; the Queen is buried under the King in column 1.
    fn buried_queen_board() -> Board {
        let mut board = Board::new();
        for (i, suit) in Suit::ALL.into_iter().enumerate() {
            let top = if suit == Suit::Hearts { 11 } else { 13 };
            for rank in 1..=top {
                board.foundations[i].push(Card::new(rank, suit));
            }
        }
        board.columns[0].push(Card::new(12, Suit::Hearts));
        board.columns[0].push(Card::new(13, Suit::Hearts));
        board
    }

    fn replay(initial: &Board, solved: &Board) -> Board {
        let mut board = initial.clone();
        for &mov in solved.history() {
            assert!(board.stack(mov.to).can_accept(mov.card), "illegal {mov}");
            board.apply_move(mov);
        }
        board
    }

    #[test]
    fn test_solve_kings_left() {
        let mut board = kings_left_board();
        let initial = board.clone();
        let result = search(&mut board, 10);
        assert!(result.solved);
        assert!(board.is_solved());
        assert_eq!(board.move_count(), 4);
        assert!(
            board
                .history()
                .iter()
                .all(|m| m.to.kind == StackKind::Foundation)
        );
        assert!(replay(&initial, &board).is_solved());
    }

    #[test]
    fn test_solve_buried_queen() {
        let mut board = buried_queen_board();
        let initial = board.clone();
        let result = search(&mut board, 10);
        assert!(result.solved);
        let labels: Vec<String> = board.history().iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, ["KH>Column2", "QH>JH", "KH>QH"]);
        assert!(replay(&initial, &board).is_solved());
    }

    #[test]
    fn test_depth_limit() {
        let mut board = buried_queen_board();
        let before = board.fingerprint();
        let result = search(&mut board, 1);
        assert!(!result.solved);
        assert!(board.history().is_empty());
        assert_eq!(board.fingerprint(), before);

        let result = search(&mut board, 2);
        assert!(result.solved);
        assert_eq!(board.move_count(), 3);
    }

    #[test]
    fn test_negative_depth_does_nothing() {
        let mut board = kings_left_board();
        let result = search(&mut board, -1);
        assert!(!result.solved);
        assert_eq!(result.expanded, 0);
        assert!(board.history().is_empty());
    }

    #[test]
    fn test_already_solved() {
        let mut board = kings_left_board();
        for i in 0..4 {
            let king = board.columns[i].pop();
            board.foundations[i].push(king);
        }
        let result = search(&mut board, 0);
        assert!(result.solved);
        assert!(board.history().is_empty());
    }

    #[test]
    fn test_unsolvable_board_is_restored() {
        // Too few cards to ever fill the foundations.
        let mut board = Board::parse("AH 2S\n3H 4C").unwrap();
        let before = board.fingerprint();
        let layout = board.to_layout_string();
        let result = search(&mut board, 20);
        assert!(!result.solved);
        assert!(result.states > 0);
        assert!(result.pruned > 0);
        assert_eq!(
            result.lookback_histogram.values().sum::<u64>(),
            result.pruned
        );
        assert_eq!(board.fingerprint(), before);
        assert_eq!(board.to_layout_string(), layout);
        assert!(board.history().is_empty());
    }

    #[test]
    fn test_shallow_search_on_full_deal_is_restored() {
        let mut board = Board::parse(TEST_GAME).unwrap();
        let before = board.fingerprint();
        let result = search(&mut board, 2);
        assert!(!result.solved);
        assert!(result.expanded > 1);
        assert_eq!(board.fingerprint(), before);
        assert!(board.is_valid());
    }

    #[test]
    fn test_sessions_do_not_share_state() {
        let mut solver = Solver::new(SolverConfig {
            depth_limit: 10,
            ..Default::default()
        });
        let mut board = buried_queen_board();
        let first = solver.search(&mut board);
        assert!(first.solved);

        let mut board = buried_queen_board();
        let second = solver.search(&mut board);
        assert!(second.solved);
        assert_eq!(first.states, second.states);
        assert_eq!(board.move_count(), 3);
    }

    #[test]
    fn test_deeper_budget_policy_solves() {
        let mut board = buried_queen_board();
        let result = Solver::new(SolverConfig {
            depth_limit: 5,
            revisit: RevisitPolicy::DeeperBudget,
            ..Default::default()
        })
        .search(&mut board);
        assert!(result.solved);
        assert!(board.is_solved());
    }

    #[test]
    fn test_state_budget_stops_and_restores() {
        let mut board = buried_queen_board();
        let before = board.fingerprint();
        let result = Solver::new(SolverConfig {
            depth_limit: 10,
            max_states: Some(1),
            ..Default::default()
        })
        .search(&mut board);
        assert!(!result.solved);
        assert!(result.exhausted);
        assert_eq!(result.states, 1);
        assert!(board.history().is_empty());
        assert_eq!(board.fingerprint(), before);
    }

    #[test]
    fn test_state_budget_is_not_reached_on_small_boards() {
        let mut board = buried_queen_board();
        let result = Solver::new(SolverConfig {
            depth_limit: 10,
            max_states: Some(1000),
            ..Default::default()
        })
        .search(&mut board);
        assert!(result.solved);
        assert!(!result.exhausted);
    }

    #[test]
    fn test_full_deal_within_state_budget() {
        let mut board = Board::parse(TEST_GAME).unwrap();
        let initial = board.clone();
        let result = Solver::new(SolverConfig {
            max_states: Some(50_000),
            ..Default::default()
        })
        .search(&mut board);
        if result.solved {
            assert!(!result.exhausted);
            assert!(replay(&initial, &board).is_solved());
        } else {
            assert!(result.states <= 50_000);
            assert_eq!(board.fingerprint(), initial.fingerprint());
            assert_eq!(board.to_layout_string(), initial.to_layout_string());
            assert!(board.history().is_empty());
        }
    }
}
