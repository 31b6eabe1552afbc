//! Finishing order for a round.
use serde::{Deserialize, Serialize};

use crate::program::RaceHorse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// 1-based finishing position.
    pub position: u8,
    pub horse_id: u32,
    pub name: String,
    pub color: String,
}

/// Append-only record of finishers, capped at the field size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultLedger {
    capacity: usize,
    entries: Vec<ResultEntry>,
}

impl ResultLedger {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Record a finisher at the next position.
    ///
    /// Unfinished horses, repeat finishers and entries past capacity are ignored.
    pub fn record(&mut self, runner: &RaceHorse) -> Option<&ResultEntry> {
        if !runner.finished || self.is_full() || self.contains(runner.horse.id) {
            return None;
        }
        let position = u8::try_from(self.entries.len() + 1).ok()?;
        self.entries.push(ResultEntry {
            position,
            horse_id: runner.horse.id,
            name: runner.horse.name.clone(),
            color: runner.horse.color.clone(),
        });
        self.entries.last()
    }

    #[must_use]
    pub fn contains(&self, horse_id: u32) -> bool {
        self.entries.iter().any(|entry| entry.horse_id == horse_id)
    }

    #[must_use]
    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Horse;

    fn runner(id: u32, finished: bool) -> RaceHorse {
        let mut runner = RaceHorse::new(
            Horse {
                id,
                name: format!("Runner {id}"),
                condition: 80,
                color: "0 0% 0%".to_string(),
            },
            u8::try_from(id).unwrap(),
        );
        if finished {
            runner.advance(100.0);
        }
        runner
    }

    #[test]
    fn positions_follow_completion_order() {
        let mut ledger = ResultLedger::with_capacity(10);
        ledger.record(&runner(4, true));
        ledger.record(&runner(2, true));
        let positions: Vec<(u8, u32)> = ledger
            .entries()
            .iter()
            .map(|e| (e.position, e.horse_id))
            .collect();
        assert_eq!(positions, vec![(1, 4), (2, 2)]);
    }

    #[test]
    fn rejects_unfinished_duplicates_and_overflow() {
        let mut ledger = ResultLedger::with_capacity(2);
        assert!(ledger.record(&runner(1, false)).is_none());
        assert!(ledger.record(&runner(1, true)).is_some());
        assert!(ledger.record(&runner(1, true)).is_none());
        assert!(ledger.record(&runner(2, true)).is_some());
        assert!(ledger.is_full());
        assert!(ledger.record(&runner(3, true)).is_none());
        assert_eq!(ledger.len(), 2);

        ledger.clear();
        assert!(ledger.is_empty());
        assert!(!ledger.is_full());
    }
}
