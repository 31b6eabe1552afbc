//! Race tuning configuration.
use num_traits::cast::cast;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

use crate::constants::{
    CONDITION_MAX, DEFAULT_BASE_SPEED, DEFAULT_CONDITION_BASE, DEFAULT_CONDITION_SPREAD,
    DEFAULT_CONDITION_WEIGHT, DEFAULT_DISTANCE_MARKER_OFFSET, DEFAULT_FIELD_SIZE,
    DEFAULT_LEADER_SPEED_CUTOFF, DEFAULT_MAX_FATIGUE, DEFAULT_MIN_RANDOM_FACTOR,
    DEFAULT_RANDOM_VARIANCE, DEFAULT_REFERENCE_DISTANCE, DEFAULT_ROSTER_SIZE,
    DEFAULT_ROUND_DISTANCES, DEFAULT_SETTLE_MS, DEFAULT_TELEMETRY_THROTTLE_MS, DEFAULT_TICK_MS,
    HORSE_NAMES, PROGRESS_COMPLETE, ROUND_COUNT,
};
use crate::error::RaceConfigError;
use crate::round::Round;

/// Timing, roster and pace settings for a race card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceConfig {
    #[serde(default = "RaceConfig::default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "RaceConfig::default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "RaceConfig::default_telemetry_throttle_ms")]
    pub telemetry_throttle_ms: u64,
    #[serde(default = "RaceConfig::default_roster_size")]
    pub roster_size: usize,
    #[serde(default = "RaceConfig::default_field_size")]
    pub field_size: usize,
    #[serde(default = "RaceConfig::default_round_distances")]
    pub round_distances: [u32; ROUND_COUNT],
    #[serde(default)]
    pub pace: PaceConfig,
    #[serde(default)]
    pub condition: ConditionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl RaceConfig {
    const fn default_tick_ms() -> u64 {
        DEFAULT_TICK_MS
    }

    const fn default_settle_ms() -> u64 {
        DEFAULT_SETTLE_MS
    }

    const fn default_telemetry_throttle_ms() -> u64 {
        DEFAULT_TELEMETRY_THROTTLE_MS
    }

    const fn default_roster_size() -> usize {
        DEFAULT_ROSTER_SIZE
    }

    const fn default_field_size() -> usize {
        DEFAULT_FIELD_SIZE
    }

    const fn default_round_distances() -> [u32; ROUND_COUNT] {
        DEFAULT_ROUND_DISTANCES
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(include_str!("../data/race.json")).unwrap_or_default()
    }

    /// Bundled configuration shipped with the crate.
    #[must_use]
    pub fn bundled() -> &'static Self {
        static CONFIG: OnceLock<RaceConfig> = OnceLock::new();
        CONFIG.get_or_init(Self::load_from_static)
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field violates its bounds.
    pub fn from_json(json: &str) -> Result<Self, RaceConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Target distance in meters for a round.
    #[must_use]
    pub fn distance_for(&self, round: Round) -> u32 {
        self.round_distances[round.index()]
    }

    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Check every field against its bounds.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), RaceConfigError> {
        if self.tick_ms == 0 {
            return Err(RaceConfigError::MinViolation {
                field: "tick_ms",
                min: 1,
                value: 0,
            });
        }
        if self.field_size == 0 {
            return Err(RaceConfigError::MinViolation {
                field: "field_size",
                min: 1,
                value: 0,
            });
        }
        if self.roster_size > HORSE_NAMES.len() {
            return Err(RaceConfigError::RosterExceedsNames {
                requested: self.roster_size,
                available: HORSE_NAMES.len(),
            });
        }
        if self.field_size > self.roster_size {
            return Err(RaceConfigError::FieldExceedsRoster {
                field_size: self.field_size,
                roster_size: self.roster_size,
            });
        }
        // Lanes are stored as u8.
        if u8::try_from(self.field_size).is_err() {
            return Err(RaceConfigError::RangeViolation {
                field: "field_size",
                min: 1.0,
                max: f64::from(u8::MAX),
                value: cast::<usize, f64>(self.field_size).unwrap_or(f64::MAX),
            });
        }
        self.validate_distances()?;
        self.pace.validate()?;
        self.condition.validate()?;
        self.telemetry.validate()
    }

    fn validate_distances(&self) -> Result<(), RaceConfigError> {
        let mut previous = 0;
        for (idx, &distance) in self.round_distances.iter().enumerate() {
            if distance <= previous {
                return Err(RaceConfigError::DistancesNotIncreasing {
                    round: idx + 1,
                    distance,
                });
            }
            previous = distance;
        }
        Ok(())
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            tick_ms: Self::default_tick_ms(),
            settle_ms: Self::default_settle_ms(),
            telemetry_throttle_ms: Self::default_telemetry_throttle_ms(),
            roster_size: Self::default_roster_size(),
            field_size: Self::default_field_size(),
            round_distances: Self::default_round_distances(),
            pace: PaceConfig::default(),
            condition: ConditionConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Per-tick speed model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceConfig {
    #[serde(default = "PaceConfig::default_reference_distance")]
    pub reference_distance: f64,
    #[serde(default = "PaceConfig::default_base_speed")]
    pub base_speed: f64,
    #[serde(default = "PaceConfig::default_condition_weight")]
    pub condition_weight: f64,
    #[serde(default = "PaceConfig::default_min_random_factor")]
    pub min_random_factor: f64,
    #[serde(default = "PaceConfig::default_random_variance")]
    pub random_variance: f64,
}

impl PaceConfig {
    const fn default_reference_distance() -> f64 {
        DEFAULT_REFERENCE_DISTANCE
    }

    const fn default_base_speed() -> f64 {
        DEFAULT_BASE_SPEED
    }

    const fn default_condition_weight() -> f64 {
        DEFAULT_CONDITION_WEIGHT
    }

    const fn default_min_random_factor() -> f64 {
        DEFAULT_MIN_RANDOM_FACTOR
    }

    const fn default_random_variance() -> f64 {
        DEFAULT_RANDOM_VARIANCE
    }

    fn validate(&self) -> Result<(), RaceConfigError> {
        check_range("pace.reference_distance", self.reference_distance, 1.0, 100_000.0)?;
        check_range("pace.base_speed", self.base_speed, 0.0, PROGRESS_COMPLETE)?;
        check_range("pace.condition_weight", self.condition_weight, 0.0, PROGRESS_COMPLETE)?;
        check_range("pace.min_random_factor", self.min_random_factor, 0.0, 10.0)?;
        check_range("pace.random_variance", self.random_variance, 0.0, 10.0)?;
        // A spent horse (condition 0) still has to reach the line.
        if self.base_speed <= 0.0 || self.min_random_factor <= 0.0 {
            return Err(RaceConfigError::RangeViolation {
                field: "pace.base_speed",
                min: f64::MIN_POSITIVE,
                max: PROGRESS_COMPLETE,
                value: self.base_speed.min(self.min_random_factor),
            });
        }
        Ok(())
    }
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self {
            reference_distance: Self::default_reference_distance(),
            base_speed: Self::default_base_speed(),
            condition_weight: Self::default_condition_weight(),
            min_random_factor: Self::default_min_random_factor(),
            random_variance: Self::default_random_variance(),
        }
    }
}

/// Starting fitness and per-round fatigue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionConfig {
    #[serde(default = "ConditionConfig::default_base")]
    pub base: u8,
    #[serde(default = "ConditionConfig::default_spread")]
    pub spread: u8,
    /// Exclusive upper bound of the condition lost after each round.
    #[serde(default = "ConditionConfig::default_max_fatigue")]
    pub max_fatigue: u8,
}

impl ConditionConfig {
    const fn default_base() -> u8 {
        DEFAULT_CONDITION_BASE
    }

    const fn default_spread() -> u8 {
        DEFAULT_CONDITION_SPREAD
    }

    const fn default_max_fatigue() -> u8 {
        DEFAULT_MAX_FATIGUE
    }

    fn validate(&self) -> Result<(), RaceConfigError> {
        if self.spread == 0 {
            return Err(RaceConfigError::MinViolation {
                field: "condition.spread",
                min: 1,
                value: 0,
            });
        }
        if self.max_fatigue == 0 {
            return Err(RaceConfigError::MinViolation {
                field: "condition.max_fatigue",
                min: 1,
                value: 0,
            });
        }
        // Drawn offsets stay below `spread`, so the ceiling is base + spread - 1.
        if u16::from(self.base) + u16::from(self.spread) > u16::from(CONDITION_MAX) + 1 {
            return Err(RaceConfigError::ConditionOverflow {
                base: self.base,
                spread: self.spread,
            });
        }
        Ok(())
    }
}

impl Default for ConditionConfig {
    fn default() -> Self {
        Self {
            base: Self::default_base(),
            spread: Self::default_spread(),
            max_fatigue: Self::default_max_fatigue(),
        }
    }
}

/// Display-only telemetry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "TelemetryConfig::default_distance_marker_offset")]
    pub distance_marker_offset: u32,
    #[serde(default = "TelemetryConfig::default_leader_speed_cutoff")]
    pub leader_speed_cutoff: f64,
}

impl TelemetryConfig {
    const fn default_distance_marker_offset() -> u32 {
        DEFAULT_DISTANCE_MARKER_OFFSET
    }

    const fn default_leader_speed_cutoff() -> f64 {
        DEFAULT_LEADER_SPEED_CUTOFF
    }

    fn validate(&self) -> Result<(), RaceConfigError> {
        check_range(
            "telemetry.leader_speed_cutoff",
            self.leader_speed_cutoff,
            0.0,
            PROGRESS_COMPLETE,
        )
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            distance_marker_offset: Self::default_distance_marker_offset(),
            leader_speed_cutoff: Self::default_leader_speed_cutoff(),
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), RaceConfigError> {
    if !(min..=max).contains(&value) {
        return Err(RaceConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}
