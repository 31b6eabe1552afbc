//! Round numbering and per-round storage.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::constants::ROUND_COUNT;

const _: () = assert!(Round::LAST.0 as usize == ROUND_COUNT);

/// One of the six heats of a race card. Always within `1..=ROUND_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Round(u8);

impl Round {
    pub const FIRST: Self = Self(1);
    pub const LAST: Self = Self(6);

    /// Build a round from its 1-based number.
    #[must_use]
    pub fn new(number: u8) -> Option<Self> {
        (1..=Self::LAST.0).contains(&number).then_some(Self(number))
    }

    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Zero-based slot for per-round tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// The following round, wrapping from the last back to the first.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 % Self::LAST.0 + 1)
    }

    #[must_use]
    pub const fn is_last(self) -> bool {
        self.0 == Self::LAST.0
    }

    /// Every round in card order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=Self::LAST.0).map(Self)
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Round {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("round {value} outside 1..={}", Self::LAST.0))
    }
}

impl From<Round> for u8 {
    fn from(value: Round) -> Self {
        value.0
    }
}

/// Fixed-size table holding one value per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundTable<T>([T; ROUND_COUNT]);

impl<T: Default> Default for RoundTable<T> {
    fn default() -> Self {
        Self(std::array::from_fn(|_| T::default()))
    }
}

impl<T> RoundTable<T> {
    /// Iterate entries alongside their round.
    pub fn iter(&self) -> impl Iterator<Item = (Round, &T)> {
        Round::all().zip(self.0.iter())
    }
}

impl<T: Default> RoundTable<T> {
    /// Reset every slot to its default value.
    pub fn clear(&mut self) {
        for slot in &mut self.0 {
            *slot = T::default();
        }
    }
}

impl<T> Index<Round> for RoundTable<T> {
    type Output = T;

    fn index(&self, round: Round) -> &Self::Output {
        &self.0[round.index()]
    }
}

impl<T> IndexMut<Round> for RoundTable<T> {
    fn index_mut(&mut self, round: Round) -> &mut Self::Output {
        &mut self.0[round.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_wrap_after_last() {
        let mut round = Round::FIRST;
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(round.number());
            round = round.next();
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 1]);
        assert!(Round::LAST.is_last());
    }

    #[test]
    fn construction_rejects_out_of_range() {
        assert!(Round::new(0).is_none());
        assert!(Round::new(7).is_none());
        assert_eq!(Round::new(3).map(Round::index), Some(2));
        assert!(Round::try_from(9).is_err());
    }

    #[test]
    fn round_serializes_as_number() {
        let json = serde_json::to_string(&Round::LAST).unwrap();
        assert_eq!(json, "6");
        let parsed: Round = serde_json::from_str("2").unwrap();
        assert_eq!(parsed.number(), 2);
        assert!(serde_json::from_str::<Round>("0").is_err());
    }

    #[test]
    fn table_indexes_by_round() {
        let mut table: RoundTable<Vec<u8>> = RoundTable::default();
        table[Round::LAST].push(9);
        assert_eq!(table[Round::LAST], vec![9]);
        assert!(table[Round::FIRST].is_empty());
        table.clear();
        assert!(table.iter().all(|(_, v)| v.is_empty()));
    }
}
