use crate::{
    board::Board,
    card::Card,
    stack::{StackId, StackKind},
};

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::fmt;

pub const LABEL_SEPARATOR: char = '>';

pub type PossibleMoves = SmallVec<[Move; 64]>;

/// A single-card move between two stacks, captured at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: StackId,
    pub to: StackId,
    pub card: Card,
    /// Top card of the destination before the move.
    pub target: Option<Card>,
}

/// Moves sharing this key are interchangeable for the search.
pub type MoveKey = (StackKind, Card, StackKind, Option<Card>);

impl Move {
    pub fn new(from: StackId, to: StackId, card: Card, target: Option<Card>) -> Self {
        Self {
            from,
            to,
            card,
            target,
        }
    }

    #[inline]
    pub fn priority(&self) -> u8 {
        self.to.kind.priority()
    }

    pub fn equivalence_key(&self) -> MoveKey {
        (self.from.kind, self.card, self.to.kind, self.target)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Some(target) => write!(f, "{}{LABEL_SEPARATOR}{target}", self.card),
            None => write!(f, "{}{LABEL_SEPARATOR}{}", self.card, self.to),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveRules {
    /// Allow cards to leave a foundation (never onto another foundation).
    pub from_foundations: bool,
    /// Allow a card to hop from one holding cell to another.
    pub cell_to_cell: bool,
}

pub fn compute_possible_moves(board: &Board, rules: MoveRules, possible_moves: &mut PossibleMoves) {
    possible_moves.clear();

    let sources = board.cells.iter().chain(board.columns.iter()).chain(
        board
            .foundations
            .iter()
            .filter(|_| rules.from_foundations),
    );
    for src in sources {
        let Some(card) = src.top() else {
            continue;
        };
        let src_kind = src.kind();
        let dests = board
            .foundations
            .iter()
            .chain(board.columns.iter())
            .chain(board.cells.iter());
        for dest in dests {
            if dest.id() == src.id() {
                continue;
            }
            match (src_kind, dest.kind()) {
                (StackKind::HoldingCell, StackKind::HoldingCell) if !rules.cell_to_cell => continue,
                (StackKind::Foundation, StackKind::Foundation) => continue,
                _ => {}
            }
            if dest.can_accept(card) {
                possible_moves.push(Move::new(src.id(), dest.id(), card, dest.top()));
            }
        }
    }
}

/// Foundations first, then columns, then holding cells. The sort is stable.
pub fn sort_by_priority(moves: &mut PossibleMoves) {
    moves.sort_by_key(Move::priority);
}

/// Keeps the first move of every equivalence group, preserving order.
pub fn filter_redundant(moves: &mut PossibleMoves) {
    let mut seen: FxHashSet<MoveKey> = FxHashSet::default();
    moves.retain(|mov| seen.insert(mov.equivalence_key()));
}

/// Legal moves in the order the search should try them.
pub fn candidate_moves(board: &Board, rules: MoveRules) -> PossibleMoves {
    let mut moves = PossibleMoves::new();
    compute_possible_moves(board, rules, &mut moves);
    sort_by_priority(&mut moves);
    filter_redundant(&mut moves);
    moves
}

pub fn format_moves(moves: &[Move]) -> String {
    let list: Vec<String> = moves.iter().map(|m| m.to_string()).collect();

    let mut output = String::new();
    let max_width = list.iter().map(|s| s.len()).max().unwrap_or_default() + 1;
    for chunk in list.chunks(10) {
        for label in chunk {
            output.push_str(&format!("{label:<width$}", width = max_width));
        }
        let trimmed = output.trim_end().len();
        output.truncate(trimmed);
        output.push('\n');
    }

    output
}
