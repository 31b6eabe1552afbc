//! The per-tick pace model.
//!
//! A tick advances every unfinished horse by one step, records new finishers in
//! the ledger, and summarizes the field for display. It never touches the
//! lifecycle; [`crate::session::RaceSession`] decides what a completed field means.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{PaceConfig, TelemetryConfig};
use crate::constants::PROGRESS_COMPLETE;
use crate::ledger::{ResultEntry, ResultLedger};
use crate::numbers::u32_to_f64;
use crate::program::RaceHorse;
use crate::telemetry::distance_marker;

/// The front-runner observed during one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderSample {
    pub horse_id: u32,
    pub name: String,
    pub progress: f64,
    /// Progress gained during this tick.
    pub delta: f64,
}

/// Field summary produced by one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Ledger entries appended during this tick, in position order.
    pub finishers: Vec<ResultEntry>,
    /// Lowest progress among horses that moved this tick.
    pub min_progress: f64,
    pub leader: Option<LeaderSample>,
    pub distance_marker: u32,
    pub all_finished: bool,
}

/// Percent of the round a horse covers in one tick before the random factor.
#[must_use]
pub fn base_step(condition: u8, pace: &PaceConfig, distance_m: u32) -> f64 {
    let base_speed =
        pace.base_speed + f64::from(condition) / PROGRESS_COMPLETE * pace.condition_weight;
    let distance_modifier = pace.reference_distance / u32_to_f64(distance_m.max(1));
    base_speed * distance_modifier
}

/// Multiplicative noise in `[min_random_factor, min_random_factor + random_variance)`.
pub fn random_factor<R: Rng + ?Sized>(pace: &PaceConfig, rng: &mut R) -> f64 {
    pace.min_random_factor + rng.r#gen::<f64>() * pace.random_variance
}

/// Advance every unfinished horse by one tick.
pub fn run_tick<R: Rng + ?Sized>(
    program: &mut [RaceHorse],
    ledger: &mut ResultLedger,
    pace: &PaceConfig,
    telemetry: &TelemetryConfig,
    distance_m: u32,
    rng: &mut R,
) -> TickReport {
    let mut finishers = Vec::new();
    let mut min_progress = PROGRESS_COMPLETE;
    let mut leader: Option<LeaderSample> = None;

    for runner in program.iter_mut().filter(|runner| !runner.finished) {
        let previous = runner.progress;
        let step = base_step(runner.horse.condition, pace, distance_m) * random_factor(pace, rng);
        let crossed = runner.advance(step);

        min_progress = min_progress.min(runner.progress);
        if leader
            .as_ref()
            .is_none_or(|current| runner.progress > current.progress)
        {
            leader = Some(LeaderSample {
                horse_id: runner.horse.id,
                name: runner.horse.name.clone(),
                progress: runner.progress,
                delta: runner.progress - previous,
            });
        }

        if crossed && let Some(entry) = ledger.record(runner) {
            finishers.push(entry.clone());
        }
    }

    TickReport {
        finishers,
        min_progress,
        leader,
        distance_marker: distance_marker(
            min_progress,
            distance_m,
            telemetry.distance_marker_offset,
        ),
        all_finished: program.iter().all(|runner| runner.finished),
    }
}
