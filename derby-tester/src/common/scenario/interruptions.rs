use anyhow::Result;

use super::TestScenario;
use crate::logic::{Interruption, RacePlan, RaceSummary};

const PAUSE_EVERY_TICKS: u32 = 25;
const REGENERATE_AFTER_TICKS: u32 = 40;

pub fn pause_resume_scenario() -> TestScenario {
    TestScenario::new(
        "pause-resume",
        "Pause/Resume Preservation",
        RacePlan::new(2)
            .with_interruption(Interruption::PauseEvery(PAUSE_EVERY_TICKS))
            .with_expectation(paused_expectation),
    )
}

pub fn regenerate_scenario() -> TestScenario {
    TestScenario::new(
        "regenerate",
        "Mid-Round Program Regeneration",
        RacePlan::new(1)
            .with_interruption(Interruption::RegenerateAfter(REGENERATE_AFTER_TICKS))
            .with_expectation(regenerated_expectation),
    )
}

fn paused_expectation(summary: &RaceSummary) -> Result<()> {
    anyhow::ensure!(summary.pauses > 0, "no pause was injected");
    anyhow::ensure!(
        summary.rounds.len() == 2,
        "paused rounds should still complete, raced {}",
        summary.rounds.len()
    );
    Ok(())
}

fn regenerated_expectation(summary: &RaceSummary) -> Result<()> {
    anyhow::ensure!(
        summary.regenerations == 1,
        "expected one regeneration, saw {}",
        summary.regenerations
    );
    let round = summary
        .rounds
        .first()
        .ok_or_else(|| anyhow::anyhow!("regenerated round never completed"))?;
    anyhow::ensure!(
        round.ticks > REGENERATE_AFTER_TICKS,
        "round {} completed in {} ticks despite the redraw",
        round.round,
        round.ticks
    );
    Ok(())
}
