//! Centralized balance and tuning constants for Derby race logic.
//!
//! These values define the default race math. `RaceConfig` starts from them
//! and a bundled JSON asset mirrors them, so a drift between the two is caught
//! by the config tests.

// Roster -------------------------------------------------------------------
pub const HORSE_NAMES: [&str; 20] = [
    "Thunder Bolt",
    "Silver Arrow",
    "Golden Spirit",
    "Dark Storm",
    "Wild Fire",
    "Blue Moon",
    "Red Fury",
    "Star Runner",
    "Night Shadow",
    "Iron Will",
    "Lucky Charm",
    "Swift Wind",
    "Brave Heart",
    "Crystal Wave",
    "Mystic Dream",
    "Royal Flash",
    "Desert Rose",
    "Ocean Breeze",
    "Amber Blaze",
    "Phantom Ride",
];

/// HSL triples, paired with `HORSE_NAMES` by position.
pub const HORSE_COLORS: [&str; 20] = [
    "0 72% 51%",
    "25 95% 53%",
    "45 93% 47%",
    "142 71% 45%",
    "199 89% 48%",
    "262 83% 58%",
    "330 81% 60%",
    "0 0% 25%",
    "15 80% 50%",
    "180 60% 40%",
    "210 70% 50%",
    "280 60% 55%",
    "350 70% 50%",
    "60 70% 45%",
    "120 50% 40%",
    "240 60% 55%",
    "300 50% 45%",
    "30 90% 50%",
    "170 60% 45%",
    "220 80% 50%",
];

pub const FALLBACK_COLOR: &str = "0 0% 0%";
pub const DEFAULT_ROSTER_SIZE: usize = 20;
pub const DEFAULT_CONDITION_BASE: u8 = 60;
pub const DEFAULT_CONDITION_SPREAD: u8 = 40;
pub const CONDITION_MAX: u8 = 100;

// Program ------------------------------------------------------------------
pub const DEFAULT_FIELD_SIZE: usize = 10;

// Rounds -------------------------------------------------------------------
pub const ROUND_COUNT: usize = 6;
pub const DEFAULT_ROUND_DISTANCES: [u32; ROUND_COUNT] = [1_200, 1_400, 1_600, 1_800, 2_000, 2_200];

// Clock --------------------------------------------------------------------
pub const DEFAULT_TICK_MS: u64 = 50;
pub const DEFAULT_SETTLE_MS: u64 = 1_000;
pub const DEFAULT_TELEMETRY_THROTTLE_MS: u64 = 500;

// Pace model ---------------------------------------------------------------
pub const PROGRESS_COMPLETE: f64 = 100.0;
pub const DEFAULT_REFERENCE_DISTANCE: f64 = 1_600.0;
pub const DEFAULT_BASE_SPEED: f64 = 0.3;
pub const DEFAULT_CONDITION_WEIGHT: f64 = 0.5;
pub const DEFAULT_MIN_RANDOM_FACTOR: f64 = 0.7;
pub const DEFAULT_RANDOM_VARIANCE: f64 = 0.5;

// Telemetry ----------------------------------------------------------------
pub const DEFAULT_DISTANCE_MARKER_OFFSET: u32 = 75;
pub const DEFAULT_LEADER_SPEED_CUTOFF: f64 = 99.0;
pub const MS_TO_KMH: f64 = 3.6;
/// Extra divisor applied to the displayed km/h figure.
pub const SPEED_DISPLAY_SCALE: f64 = 100.0;

// Fatigue ------------------------------------------------------------------
/// Exclusive upper bound of the per-round condition loss.
pub const DEFAULT_MAX_FATIGUE: u8 = 10;
