use anyhow::{Context, Result, bail};
use std::{cmp::Ordering, fmt, str::FromStr};

pub const MAX_RANK: u8 = 13;
pub const MAX_SUIT: u8 = 4;
pub const MAX_CARD: u8 = MAX_SUIT * MAX_RANK;

const RANKS: [char; MAX_RANK as usize] = [
    'A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Hearts,
    Clubs,
    Spades,
    Diamonds,
}

impl Suit {
    pub const ALL: [Suit; MAX_SUIT as usize] =
        [Suit::Hearts, Suit::Clubs, Suit::Spades, Suit::Diamonds];

    pub fn color(self) -> Color {
        match self {
            Suit::Hearts | Suit::Diamonds => Color::Red,
            Suit::Clubs | Suit::Spades => Color::Black,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Suit::Hearts => 'H',
            Suit::Clubs => 'C',
            Suit::Spades => 'S',
            Suit::Diamonds => 'D',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL.into_iter().find(|suit| suit.symbol() == symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Black,
}

/// A playing card packed into a single byte: `suit * 13 + (rank - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card(u8);

impl Card {
    /// Builds a card from a 1-based rank (Ace = 1, King = 13).
    pub fn new(rank: u8, suit: Suit) -> Self {
        assert!(
            (1..=MAX_RANK).contains(&rank),
            "rank {rank} is out of range 1..={MAX_RANK}"
        );
        Self(suit as u8 * MAX_RANK + rank - 1)
    }

    /// All 52 cards, suit by suit, Ace to King.
    pub fn deck() -> impl Iterator<Item = Card> {
        (0..MAX_CARD).map(Card)
    }

    pub fn parse(token: &str) -> Result<Self> {
        let mut chars = token.chars();
        let (Some(rank), Some(suit), None) = (chars.next(), chars.next(), chars.next()) else {
            bail!("Invalid card '{token}', expected a rank and a suit character");
        };
        let rank = RANKS
            .iter()
            .position(|&r| r == rank)
            .with_context(|| format!("Invalid rank at card {token}"))?;
        let suit = Suit::from_symbol(suit).with_context(|| format!("Invalid suit at card {token}"))?;
        Ok(Card::new(rank as u8 + 1, suit))
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    pub fn rank(&self) -> u8 {
        self.0 % MAX_RANK + 1
    }

    pub fn suit(&self) -> Suit {
        Suit::ALL[(self.0 / MAX_RANK) as usize]
    }

    pub fn color(&self) -> Color {
        self.suit().color()
    }

    pub fn is_ace(&self) -> bool {
        self.rank() == 1
    }

    pub fn is_king(&self) -> bool {
        self.rank() == MAX_RANK
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.suit().cmp(&other.suit()))
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            RANKS[(self.rank() - 1) as usize],
            self.suit().symbol()
        )
    }
}

impl FromStr for Card {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Card::parse(s)
    }
}
