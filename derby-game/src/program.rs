//! Round selector: draws the field and lane assignments for a round.
use rand::Rng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

use crate::constants::PROGRESS_COMPLETE;
use crate::error::RaceError;
use crate::roster::{Horse, Roster};

/// A horse entered in the current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceHorse {
    #[serde(flatten)]
    pub horse: Horse,
    /// Percent of the round distance covered, `0.0..=100.0`.
    pub progress: f64,
    /// 1-based lane, stable for the round.
    pub lane: u8,
    pub finished: bool,
}

impl RaceHorse {
    /// Place a horse at the start line of `lane`.
    #[must_use]
    pub const fn new(horse: Horse, lane: u8) -> Self {
        Self {
            horse,
            progress: 0.0,
            lane,
            finished: false,
        }
    }

    /// Advance by `step` percent, clamping at the line.
    ///
    /// Returns `true` when this step carried the horse over the line.
    pub fn advance(&mut self, step: f64) -> bool {
        if self.finished {
            return false;
        }
        self.progress = (self.progress + step.max(0.0)).min(PROGRESS_COMPLETE);
        self.finished = self.progress >= PROGRESS_COMPLETE;
        self.finished
    }

    /// Send the horse back to the start line, keeping its lane and condition.
    pub const fn rest(&mut self) {
        self.progress = 0.0;
        self.finished = false;
    }
}

/// Sample `field_size` distinct horses and assign lanes `1..=field_size` in draw order.
///
/// # Errors
///
/// Returns [`RaceError::RosterTooSmall`] when the roster cannot fill the field.
pub fn draw_program<R: Rng + ?Sized>(
    roster: &Roster,
    field_size: usize,
    rng: &mut R,
) -> Result<Vec<RaceHorse>, RaceError> {
    if roster.len() < field_size || u8::try_from(field_size).is_err() {
        return Err(RaceError::RosterTooSmall {
            available: roster.len(),
            required: field_size,
        });
    }

    let horses = roster.horses();
    Ok(sample(rng, horses.len(), field_size)
        .into_iter()
        .zip(1u8..)
        .map(|(idx, lane)| RaceHorse::new(horses[idx].clone(), lane))
        .collect())
}
