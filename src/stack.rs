use crate::card::Card;

use smallvec::SmallVec;
use std::fmt;

const STACK_SIZE: usize = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StackKind {
    HoldingCell,
    Foundation,
    Column,
}

impl StackKind {
    /// Search order for moves landing on this kind of stack; lower goes first.
    pub fn priority(self) -> u8 {
        match self {
            StackKind::Foundation => 0,
            StackKind::Column => 1,
            StackKind::HoldingCell => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StackKind::HoldingCell => "HoldingCell",
            StackKind::Foundation => "Foundation",
            StackKind::Column => "Column",
        }
    }
}

/// Stable identity of a stack on the board: its kind and slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackId {
    pub kind: StackKind,
    pub index: u8,
}

impl StackId {
    pub const fn new(kind: StackKind, index: u8) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.name(), self.index + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    id: StackId,
    cards: SmallVec<[Card; STACK_SIZE]>,
}

impl Stack {
    pub fn new(id: StackId) -> Self {
        Self {
            id,
            cards: SmallVec::new(),
        }
    }

    pub fn id(&self) -> StackId {
        self.id
    }

    pub fn kind(&self) -> StackKind {
        self.id.kind
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[inline]
    pub fn top(&self) -> Option<Card> {
        self.cards.last().copied()
    }

    #[inline]
    pub fn at(&self, index: usize) -> Option<Card> {
        self.cards.get(index).copied()
    }

    /// Removes the top card. Popping an empty stack is a caller bug.
    #[inline]
    pub fn pop(&mut self) -> Card {
        match self.cards.pop() {
            Some(card) => card,
            None => panic!("pop from empty stack {}", self.id),
        }
    }

    #[inline]
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn can_accept(&self, card: Card) -> bool {
        match self.id.kind {
            StackKind::HoldingCell => self.cards.is_empty(),
            StackKind::Foundation => match self.top() {
                None => card.is_ace(),
                Some(top) => top.suit() == card.suit() && top.rank() + 1 == card.rank(),
            },
            StackKind::Column => match self.top() {
                None => true,
                Some(top) => top.color() != card.color() && top.rank() == card.rank() + 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(token: &str) -> Card {
        Card::parse(token).unwrap()
    }

    #[test]
    fn test_holding_cell_accepts_only_when_empty() {
        let mut cell = Stack::new(StackId::new(StackKind::HoldingCell, 0));
        assert!(cell.can_accept(card("KS")));
        cell.push(card("7D"));
        for token in ["AH", "6C", "KS"] {
            assert!(!cell.can_accept(card(token)));
        }
        assert_eq!(cell.pop(), card("7D"));
        assert!(cell.can_accept(card("KS")));
    }

    #[test]
    fn test_foundation_accepts_ascending_suit() {
        let mut foundation = Stack::new(StackId::new(StackKind::Foundation, 2));
        assert!(foundation.can_accept(card("AH")));
        assert!(foundation.can_accept(card("AS")));
        assert!(!foundation.can_accept(card("2H")));

        for rank in 1..=5 {
            foundation.push(Card::new(rank, crate::card::Suit::Hearts));
        }
        assert_eq!(foundation.top(), Some(card("5H")));
        assert!(foundation.can_accept(card("6H")));
        for token in ["6D", "7H", "5H", "4H", "AH"] {
            assert!(!foundation.can_accept(card(token)), "{token}");
        }
    }

    #[test]
    fn test_column_accepts_descending_alternating() {
        let mut column = Stack::new(StackId::new(StackKind::Column, 0));
        assert!(column.can_accept(card("9C")));
        column.push(card("9C"));
        assert!(column.can_accept(card("8H")));
        assert!(column.can_accept(card("8D")));
        assert!(!column.can_accept(card("8S")));
        assert!(!column.can_accept(card("TH")));
        assert!(!column.can_accept(card("7H")));
    }

    #[test]
    fn test_peek_and_at() {
        let mut column = Stack::new(StackId::new(StackKind::Column, 4));
        assert_eq!(column.top(), None);
        assert_eq!(column.at(0), None);
        column.push(card("QD"));
        column.push(card("JS"));
        assert_eq!(column.len(), 2);
        assert_eq!(column.top(), Some(card("JS")));
        assert_eq!(column.at(0), Some(card("QD")));
        assert_eq!(column.at(2), None);
        assert_eq!(column.id().to_string(), "Column5");
    }

    #[test]
    #[should_panic(expected = "pop from empty stack HoldingCell1")]
    fn test_pop_empty_panics() {
        Stack::new(StackId::new(StackKind::HoldingCell, 0)).pop();
    }
}
