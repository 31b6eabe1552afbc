use thiserror::Error;

use crate::round::Round;

/// Errors raised by race operations invoked out of order or on a bad roster.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RaceError {
    #[error("round {round} has no program; generate one before starting")]
    NoProgram { round: Round },
    #[error("round {round} is settling and cannot be started or paused")]
    Settling { round: Round },
    #[error("clock for round {round} was halted before the round completed")]
    ClockHalted { round: Round },
    #[error("roster holds {available} horses but a field needs {required}")]
    RosterTooSmall { available: usize, required: usize },
}

/// Errors raised when race configuration invariants are violated.
#[derive(Debug, Error)]
pub enum RaceConfigError {
    #[error("failed to parse race config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("field size {field_size} exceeds roster size {roster_size}")]
    FieldExceedsRoster {
        field_size: usize,
        roster_size: usize,
    },
    #[error("roster size {requested} exceeds the {available} available horse names")]
    RosterExceedsNames { requested: usize, available: usize },
    #[error("round distances must strictly increase (round {round} has {distance}m)")]
    DistancesNotIncreasing { round: usize, distance: u32 },
    #[error("condition base {base} plus spread {spread} exceeds 100")]
    ConditionOverflow { base: u8, spread: u8 },
    #[error("horse {id} has condition {condition}, above the maximum of 100")]
    HorseConditionOutOfRange { id: u32, condition: u8 },
    #[error("horse id {id} appears more than once in the roster")]
    DuplicateHorse { id: u32 },
}
