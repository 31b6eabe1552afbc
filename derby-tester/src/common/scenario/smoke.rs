use anyhow::Result;

use super::TestScenario;
use crate::logic::{RacePlan, RaceSummary};

pub fn smoke_scenario() -> TestScenario {
    TestScenario::new(
        "smoke",
        "Single Round Smoke Test",
        RacePlan::new(1).with_expectation(smoke_expectation),
    )
}

fn smoke_expectation(summary: &RaceSummary) -> Result<()> {
    anyhow::ensure!(
        summary.rounds.len() == 1,
        "expected one round, raced {}",
        summary.rounds.len()
    );
    let round = &summary.rounds[0];
    anyhow::ensure!(!round.results.is_empty(), "round {} has no results", round.round);
    anyhow::ensure!(round.ticks > 0, "round {} finished without ticking", round.round);
    anyhow::ensure!(
        summary.final_round == round.round.next(),
        "session sits in round {} after racing round {}",
        summary.final_round,
        round.round
    );
    Ok(())
}
