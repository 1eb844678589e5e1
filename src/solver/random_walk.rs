use crate::{
    board::Board,
    moves::{MoveRules, PossibleMoves, compute_possible_moves},
};

use rand::{Rng, seq::IndexedRandom};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkConfig {
    pub attempts: usize,
    /// Moves per attempt before giving up and rewinding.
    pub max_moves: usize,
    pub rules: MoveRules,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            attempts: 100,
            max_moves: 100,
            rules: MoveRules::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkResult {
    pub solved: bool,
    pub attempts: usize,
}

/// Plays uniformly random legal moves, rewinding after every failed attempt.
pub fn random_walk<R: Rng + ?Sized>(
    board: &mut Board,
    config: &WalkConfig,
    rng: &mut R,
) -> WalkResult {
    let start = board.move_count();
    let mut moves = PossibleMoves::new();

    for attempt in 1..=config.attempts {
        for step in 1..=config.max_moves {
            compute_possible_moves(board, config.rules, &mut moves);
            let Some(&mov) = moves.choose(&mut *rng) else {
                debug!(attempt, step, "No moves possible");
                break;
            };
            trace!(attempt, step, "Making move {mov}");
            board.apply_move(mov);
            if board.is_solved() {
                debug!(attempt, moves = board.move_count() - start, "Solved");
                return WalkResult {
                    solved: true,
                    attempts: attempt,
                };
            }
        }

        debug!(
            attempt,
            moves = board.move_count() - start,
            foundation = board.foundation_score(),
            "Attempt failed, rewinding"
        );
        while board.move_count() > start {
            board.undo_last_move();
        }
    }

    WalkResult {
        solved: false,
        attempts: config.attempts,
    }
}
