//! Display telemetry derived from each tick: leader speed and the field marker.
use serde::{Deserialize, Serialize};

use crate::constants::{MS_TO_KMH, PROGRESS_COMPLETE, SPEED_DISPLAY_SCALE};
use crate::numbers::{ms_to_secs, round_f64_to_i32, round_f64_to_u32, u32_to_f64};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderTelemetry {
    pub name: String,
    /// Rounded display speed.
    pub speed: i32,
}

/// Convert a leader's per-tick progress delta into the displayed speed.
///
/// Percent per tick becomes m/s over the round distance, then km/h, then is
/// divided by [`SPEED_DISPLAY_SCALE`] before rounding.
#[must_use]
pub fn leader_display_speed(delta_percent: f64, distance_m: u32, tick_ms: u64) -> i32 {
    let tick_secs = ms_to_secs(tick_ms);
    if tick_secs <= 0.0 {
        return 0;
    }
    let meters_per_sec = (delta_percent / PROGRESS_COMPLETE * u32_to_f64(distance_m)) / tick_secs;
    round_f64_to_i32(meters_per_sec * MS_TO_KMH / SPEED_DISPLAY_SCALE)
}

/// Distance marker for the back of the field: `round(min% × distance) + offset`,
/// capped at the round distance.
#[must_use]
pub fn distance_marker(min_progress: f64, distance_m: u32, offset_m: u32) -> u32 {
    let covered = round_f64_to_u32(min_progress / PROGRESS_COMPLETE * u32_to_f64(distance_m));
    covered.saturating_add(offset_m).min(distance_m)
}

/// Last-emitted-timestamp guard for leader updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Throttle {
    interval_ms: u64,
    last_emit_ms: Option<u64>,
}

impl Throttle {
    #[must_use]
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_emit_ms: None,
        }
    }

    /// Returns `true` and records `now_ms` if an emission is allowed.
    pub fn try_emit(&mut self, now_ms: u64) -> bool {
        match self.last_emit_ms {
            Some(last) if now_ms.saturating_sub(last) < self.interval_ms => false,
            _ => {
                self.last_emit_ms = Some(now_ms);
                true
            }
        }
    }

    pub const fn reset(&mut self) {
        self.last_emit_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_speed_keeps_extra_scale() {
        // 0.5% of 1600m in 50ms = 160 m/s = 576 km/h, shown as 6.
        assert_eq!(leader_display_speed(0.5, 1_600, 50), 6);
        assert_eq!(leader_display_speed(0.0, 1_600, 50), 0);
        assert_eq!(leader_display_speed(0.5, 1_600, 0), 0);
    }

    #[test]
    fn marker_adds_offset_and_caps() {
        assert_eq!(distance_marker(0.0, 1_200, 75), 75);
        assert_eq!(distance_marker(50.0, 1_200, 75), 675);
        assert_eq!(distance_marker(97.0, 1_200, 75), 1_200);
        assert_eq!(distance_marker(100.0, 2_200, 75), 2_200);
    }

    #[test]
    fn throttle_gates_by_interval() {
        let mut throttle = Throttle::new(500);
        assert!(throttle.try_emit(50));
        assert!(!throttle.try_emit(100));
        assert!(!throttle.try_emit(549));
        assert!(throttle.try_emit(550));
        throttle.reset();
        assert!(throttle.try_emit(560));
    }
}
