pub mod race_tester;
pub mod reports;
pub mod seeds;
pub mod tester;

pub use race_tester::{Interruption, RacePlan, RaceSummary, RaceTester};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use tester::*;
