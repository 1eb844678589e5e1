use crate::{
    card::{Card, MAX_CARD},
    moves::Move,
    stack::{Stack, StackId, StackKind},
};

use anyhow::{Context, Result, bail};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::Hasher;

pub const TOTAL_CELLS: usize = 4;
pub const TOTAL_FOUNDATIONS: usize = 4;
pub const TOTAL_COLUMNS: usize = 8;

const EMPTY_SLOT: u8 = 0xff;
const COLUMN_END: u8 = 0xfe;

/// Hash of a board's canonical encoding, used as the visited-state key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

#[derive(Debug, Clone)]
pub struct Board {
    pub cells: [Stack; TOTAL_CELLS],
    pub foundations: [Stack; TOTAL_FOUNDATIONS],
    pub columns: [Stack; TOTAL_COLUMNS],
    history: Vec<Move>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: std::array::from_fn(|i| {
                Stack::new(StackId::new(StackKind::HoldingCell, i as u8))
            }),
            foundations: std::array::from_fn(|i| {
                Stack::new(StackId::new(StackKind::Foundation, i as u8))
            }),
            columns: std::array::from_fn(|i| Stack::new(StackId::new(StackKind::Column, i as u8))),
            history: Vec::new(),
        }
    }

    /// Deals cards round-robin into the columns.
    pub fn deal(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut board = Self::new();
        for (i, card) in cards.into_iter().enumerate() {
            board.columns[i % TOTAL_COLUMNS].push(card);
        }
        board
    }

    pub fn new_random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck: Vec<Card> = Card::deck().collect();
        deck.shuffle(rng);
        Self::deal(deck)
    }

    pub fn new_from_seed(seed: u64) -> Self {
        Self::new_random(&mut StdRng::seed_from_u64(seed))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut cards = Vec::with_capacity(MAX_CARD as usize);
        for (n, line) in content.lines().enumerate() {
            for token in line.split_whitespace() {
                let card = Card::parse(token)
                    .with_context(|| format!("Failed to parse line {}: '{}'", n + 1, line.trim()))?;
                cards.push(card);
            }
        }
        Ok(Self::deal(cards))
    }

    pub fn stack(&self, id: StackId) -> &Stack {
        let index = id.index as usize;
        match id.kind {
            StackKind::HoldingCell => &self.cells[index],
            StackKind::Foundation => &self.foundations[index],
            StackKind::Column => &self.columns[index],
        }
    }

    pub fn stack_mut(&mut self, id: StackId) -> &mut Stack {
        let index = id.index as usize;
        match id.kind {
            StackKind::HoldingCell => &mut self.cells[index],
            StackKind::Foundation => &mut self.foundations[index],
            StackKind::Column => &mut self.columns[index],
        }
    }

    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        self.cells
            .iter()
            .chain(self.foundations.iter())
            .chain(self.columns.iter())
    }

    /// Applies a move produced by the move generator. No legality check is made.
    pub fn apply_move(&mut self, mov: Move) {
        let card = self.stack_mut(mov.from).pop();
        self.stack_mut(mov.to).push(card);
        self.history.push(mov);
    }

    pub fn undo_last_move(&mut self) -> Move {
        let mov = self.history.pop().expect("no move to undo");
        let card = self.stack_mut(mov.to).pop();
        self.stack_mut(mov.from).push(card);
        mov
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    pub fn is_solved(&self) -> bool {
        self.foundations
            .iter()
            .all(|f| f.top().is_some_and(|card| card.is_king()))
            && self.cells.iter().all(Stack::is_empty)
            && self.columns.iter().all(Stack::is_empty)
    }

    pub fn foundation_score(&self) -> usize {
        self.foundations.iter().map(Stack::len).sum()
    }

    /// Checks that every card of the deck is on the board exactly once.
    pub fn validate(&self) -> Result<()> {
        let mut seen = [false; MAX_CARD as usize];
        for stack in self.stacks() {
            for &card in stack.cards() {
                let id = card.id() as usize;
                if seen[id] {
                    bail!("Duplicate card {card} in {}", stack.id());
                }
                seen[id] = true;
            }
        }
        let missing: Vec<String> = Card::deck()
            .filter(|card| !seen[card.id() as usize])
            .map(|card| card.to_string())
            .collect();
        if !missing.is_empty() {
            bail!("Missing cards: {}", missing.join(" "));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let mut state: SmallVec<[u8; 96]> = SmallVec::new();
        self.encode_state(&mut state);
        let mut hasher = FxHasher::default();
        hasher.write(&state);
        Fingerprint(hasher.finish())
    }

    // Cells and foundations are fixed slots: only their tops matter.
    fn encode_state(&self, state: &mut SmallVec<[u8; 96]>) {
        let slot = |card: Option<Card>| card.map_or(EMPTY_SLOT, |c| c.id());
        state.extend(self.cells.iter().map(|s| slot(s.top())));
        state.extend(self.foundations.iter().map(|s| slot(s.top())));
        for column in &self.columns {
            state.extend(column.cards().iter().map(Card::id));
            state.push(COLUMN_END);
        }
    }

    /// Textual snapshot: a `cells|foundations` header, then one line per column row.
    pub fn to_layout_string(&self) -> String {
        let mut output = String::new();
        output.push_str(&cards_to_line(self.cells.iter().map(Stack::top)));
        output.push('|');
        output.push_str(&cards_to_line(self.foundations.iter().map(Stack::top)));
        output.push('\n');
        let rows = self.columns.iter().map(Stack::len).max().unwrap_or(0);
        for row in 0..rows {
            output.push_str(&cards_to_line(self.columns.iter().map(|c| c.at(row))));
            output.push('\n');
        }
        output
    }

    /// Column rows in the format accepted by [`Board::parse`].
    pub fn to_deal_string(&self) -> String {
        let rows = self.columns.iter().map(Stack::len).max().unwrap_or(0);
        let mut output = String::new();
        for row in 0..rows {
            let line: Vec<String> = self
                .columns
                .iter()
                .filter_map(|c| c.at(row))
                .map(|card| card.to_string())
                .collect();
            output.push_str(&line.join(" "));
            output.push('\n');
        }
        output
    }
}

fn cards_to_line(cards: impl Iterator<Item = Option<Card>>) -> String {
    cards
        .map(|card| card.map_or_else(|| "  ".to_string(), |c| c.to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}
