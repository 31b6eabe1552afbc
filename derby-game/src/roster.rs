//! Persistent roster of horses for a session.
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::collections::HashSet;

use crate::config::RaceConfig;
use crate::constants::{CONDITION_MAX, FALLBACK_COLOR, HORSE_COLORS, HORSE_NAMES};
use crate::error::RaceConfigError;
use crate::program::RaceHorse;

/// A horse in the session roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horse {
    pub id: u32,
    pub name: String,
    /// Fitness in `0..=100`; only ever lowered by fatigue.
    pub condition: u8,
    /// HSL triple, e.g. `"0 72% 51%"`.
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    horses: Vec<Horse>,
}

impl Roster {
    /// Build `cfg.roster_size` horses from the static name and color lists.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(cfg: &RaceConfig, rng: &mut R) -> Self {
        let spread = cfg.condition.spread.max(1);
        let horses = HORSE_NAMES
            .iter()
            .take(cfg.roster_size)
            .enumerate()
            .map(|(idx, name)| Horse {
                id: u32::try_from(idx + 1).unwrap_or(u32::MAX),
                name: (*name).to_string(),
                condition: cfg
                    .condition
                    .base
                    .saturating_add(rng.gen_range(0..spread))
                    .min(CONDITION_MAX),
                color: HORSE_COLORS
                    .get(idx)
                    .copied()
                    .unwrap_or(FALLBACK_COLOR)
                    .to_string(),
            })
            .collect();
        Self { horses }
    }

    /// Wrap an externally supplied list of horses.
    ///
    /// # Errors
    ///
    /// Returns an error if a condition exceeds [`CONDITION_MAX`] or an id repeats.
    pub fn from_horses(horses: Vec<Horse>) -> Result<Self, RaceConfigError> {
        let mut ids = HashSet::with_capacity(horses.len());
        for horse in &horses {
            if horse.condition > CONDITION_MAX {
                return Err(RaceConfigError::HorseConditionOutOfRange {
                    id: horse.id,
                    condition: horse.condition,
                });
            }
            if !ids.insert(horse.id) {
                return Err(RaceConfigError::DuplicateHorse { id: horse.id });
            }
        }
        Ok(Self { horses })
    }

    #[must_use]
    pub fn horses(&self) -> &[Horse] {
        &self.horses
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Horse> {
        self.horses.iter().find(|horse| horse.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.horses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.horses.is_empty()
    }

    /// Write round-local conditions back to the persistent roster.
    ///
    /// Conditions are only ever lowered here; a stale program cannot restore fitness.
    pub fn commit_conditions(&mut self, program: &[RaceHorse]) {
        for runner in program {
            if let Some(horse) = self.horses.iter_mut().find(|h| h.id == runner.horse.id) {
                horse.condition = horse.condition.min(runner.horse.condition);
            }
        }
    }

    /// Bring a stored program's conditions in line with the roster.
    pub fn refresh_conditions(&self, program: &mut [RaceHorse]) {
        for runner in program {
            if let Some(horse) = self.get(runner.horse.id) {
                runner.horse.condition = horse.condition;
            }
        }
    }

    /// Sum of every horse's condition.
    #[must_use]
    pub fn total_condition(&self) -> u32 {
        self.horses.iter().map(|h| u32::from(h.condition)).sum()
    }
}
