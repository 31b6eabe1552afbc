use anyhow::Result;
use derby_game::{RaceStatus, Round};

use super::TestScenario;
use crate::logic::{RacePlan, RaceSummary};

pub fn full_card_scenario() -> TestScenario {
    TestScenario::new(
        "full-card",
        "Full Six-Round Card",
        RacePlan::new(6)
            .with_expectation(card_wraps_expectation)
            .with_expectation(distances_expectation)
            .with_expectation(fatigue_expectation),
    )
}

pub fn replay_scenario() -> TestScenario {
    TestScenario::new(
        "replay",
        "Deterministic Replay",
        RacePlan::new(2).with_replay_check(),
    )
}

fn card_wraps_expectation(summary: &RaceSummary) -> Result<()> {
    let raced: Vec<Round> = summary.rounds.iter().map(|r| r.round).collect();
    anyhow::ensure!(
        raced == Round::all().collect::<Vec<_>>(),
        "rounds raced out of order: {raced:?}"
    );
    anyhow::ensure!(
        summary.final_round == Round::FIRST && summary.final_status == RaceStatus::Idle,
        "card should wrap to an idle round 1, found round {} {:?}",
        summary.final_round,
        summary.final_status
    );
    Ok(())
}

fn distances_expectation(summary: &RaceSummary) -> Result<()> {
    for pair in summary.rounds.windows(2) {
        anyhow::ensure!(
            pair[1].distance_m > pair[0].distance_m,
            "round {} ({}m) is not longer than round {} ({}m)",
            pair[1].round,
            pair[1].distance_m,
            pair[0].round,
            pair[0].distance_m
        );
    }
    Ok(())
}

fn fatigue_expectation(summary: &RaceSummary) -> Result<()> {
    let per_round: u32 = summary.rounds.iter().map(|r| r.condition_lost).sum();
    anyhow::ensure!(
        per_round == summary.condition_lost,
        "per-round fatigue {per_round} disagrees with roster loss {}",
        summary.condition_lost
    );
    for round in &summary.rounds {
        let field = u32::try_from(round.results.len()).unwrap_or(u32::MAX);
        anyhow::ensure!(
            round.condition_lost <= field.saturating_mul(9),
            "round {} lost {} condition across {field} horses",
            round.round,
            round.condition_lost
        );
    }
    Ok(())
}
