//! Derby Race Engine
//!
//! Platform-agnostic core logic for the Derby horse-race game: roster
//! generation, per-round programs, the tick-driven pace model, round lifecycle
//! and result ledgers. Rendering is left to whatever consumes [`RaceSnapshot`].

pub mod clock;
pub mod config;
pub mod constants;
#[cfg(feature = "async")]
pub mod driver;
pub mod error;
pub mod ledger;
pub mod numbers;
pub mod program;
pub mod rng;
pub mod roster;
pub mod round;
pub mod session;
pub mod telemetry;

// Re-export commonly used types
pub use clock::{LeaderSample, TickReport, run_tick};
pub use config::{ConditionConfig, PaceConfig, RaceConfig, TelemetryConfig};
#[cfg(feature = "async")]
pub use driver::{DriveOutcome, RaceDriver};
pub use error::{RaceConfigError, RaceError};
pub use ledger::{ResultEntry, ResultLedger};
pub use program::{RaceHorse, draw_program};
pub use rng::RngBundle;
pub use roster::{Horse, Roster};
pub use round::{Round, RoundTable};
pub use session::{
    AdvanceReport, ClockToken, RaceSession, RaceSnapshot, RaceStatus, RoundSummary,
    SettleOutcome, SettleTicket, StartOutcome, TickOutcome,
};
pub use telemetry::LeaderTelemetry;
