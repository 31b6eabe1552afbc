use anyhow::{Context, Result, bail};
use colored::Colorize;
use derby_game::{
    ClockToken, DriveOutcome, Horse, RaceConfig, RaceDriver, RaceError, RaceHorse, RaceSession,
    RaceStatus, ResultEntry, ResultLedger, Round, RoundSummary, SettleOutcome, TickOutcome,
};
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Disturbance injected into a running round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    /// Pause and immediately resume every `n` ticks.
    PauseEvery(u32),
    /// Redraw the program once after `n` ticks and race the new field.
    RegenerateAfter(u32),
}

impl Interruption {
    const fn ticks(self) -> u32 {
        match self {
            Self::PauseEvery(n) | Self::RegenerateAfter(n) => n,
        }
    }
}

/// What to race and what must hold afterwards.
#[derive(Debug, Clone)]
pub struct RacePlan {
    pub rounds: usize,
    pub interruption: Option<Interruption>,
    pub verify_replay: bool,
    pub expectations: Vec<RaceExpectation>,
}

impl RacePlan {
    #[must_use]
    pub const fn new(rounds: usize) -> Self {
        Self {
            rounds,
            interruption: None,
            verify_replay: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_interruption(mut self, interruption: Interruption) -> Self {
        self.interruption = Some(interruption);
        self
    }

    /// Race the plan twice from the same seed and require identical rounds.
    #[must_use]
    pub const fn with_replay_check(mut self) -> Self {
        self.verify_replay = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<RaceExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a plan completes.
type RaceExpectationFn = Arc<dyn Fn(&RaceSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct RaceExpectation(RaceExpectationFn);

impl std::fmt::Debug for RaceExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaceExpectation").finish()
    }
}

impl RaceExpectation {
    pub fn evaluate(&self, summary: &RaceSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for RaceExpectation
where
    F: Fn(&RaceSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of one plan raced from one seed.
#[derive(Debug, Clone)]
pub struct RaceSummary {
    pub seed: u64,
    pub rounds: Vec<RoundSummary>,
    pub final_round: Round,
    pub final_status: RaceStatus,
    pub pauses: u32,
    pub regenerations: u32,
    /// Summed roster condition before the first round.
    pub starting_condition: u32,
    /// Roster condition lost over the whole plan.
    pub condition_lost: u32,
    /// Invariant breaches observed while racing.
    pub violations: Vec<String>,
}

impl RaceSummary {
    fn new(seed: u64, roster: &[Horse]) -> Self {
        Self {
            seed,
            rounds: Vec::new(),
            final_round: Round::FIRST,
            final_status: RaceStatus::Idle,
            pauses: 0,
            regenerations: 0,
            starting_condition: roster_condition(roster),
            condition_lost: 0,
            violations: Vec::new(),
        }
    }

    fn finish(&mut self, round: Round, status: RaceStatus, roster: &[Horse]) {
        self.final_round = round;
        self.final_status = status;
        self.condition_lost = self
            .starting_condition
            .saturating_sub(roster_condition(roster));
    }

    #[must_use]
    pub fn total_ticks(&self) -> u32 {
        self.rounds.iter().map(|round| round.ticks).sum()
    }
}

/// Headless runner that races plans against the core engine.
#[derive(Debug, Clone)]
pub struct RaceTester {
    config: RaceConfig,
    verbose: bool,
}

impl RaceTester {
    #[must_use]
    pub const fn new(config: RaceConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    /// Race `plan` from `seed` with simulated time.
    ///
    /// # Errors
    ///
    /// Fails when the session cannot be built or a round cannot be started.
    pub fn run_plan(&self, plan: &RacePlan, seed: u64) -> Result<RaceSummary> {
        let mut summary = self.simulate(plan, seed)?;
        if plan.verify_replay {
            let replay = self.simulate(plan, seed)?;
            if replay.rounds != summary.rounds {
                summary
                    .violations
                    .push(format!("seed {seed} did not replay identically"));
            }
        }
        Ok(summary)
    }

    fn simulate(&self, plan: &RacePlan, seed: u64) -> Result<RaceSummary> {
        let mut session =
            RaceSession::new(self.config.clone(), seed).context("invalid race config")?;
        let mut summary = RaceSummary::new(seed, session.roster().horses());
        for _ in 0..plan.rounds {
            let round = self.simulate_round(&mut session, plan.interruption, &mut summary)?;
            self.report_round(&round);
            summary.rounds.push(round);
        }
        summary.finish(
            session.round(),
            session.status(),
            session.roster().horses(),
        );
        Ok(summary)
    }

    fn simulate_round(
        &self,
        session: &mut RaceSession,
        interruption: Option<Interruption>,
        summary: &mut RaceSummary,
    ) -> Result<RoundSummary> {
        let round = session.round();
        let condition_before = roster_condition(session.roster().horses());
        session.generate_program()?;
        let started_at = session.clock_ms();
        let mut monitor = FieldMonitor::new(round, session.program());
        let mut token = session.start()?;
        let mut ticks = 0u32;
        let mut regenerated = false;

        let ticket = loop {
            ticks += 1;
            let outcome = session.tick(token);
            monitor.check(session.program(), session.ledger(), &mut summary.violations);
            match outcome {
                TickOutcome::Advanced(_) => {}
                TickOutcome::RoundComplete { ticket, .. } => break ticket,
                TickOutcome::Stale => bail!("round {round} clock halted after {ticks} ticks"),
            }

            match interruption {
                Some(Interruption::PauseEvery(every)) if every > 0 && ticks % every == 0 => {
                    session.pause();
                    summary.pauses += 1;
                    expect_stale(session, token, "paused", &mut summary.violations);
                    token = session.start()?;
                }
                Some(Interruption::RegenerateAfter(after)) if !regenerated && ticks == after => {
                    session.generate_program()?;
                    regenerated = true;
                    summary.regenerations += 1;
                    expect_stale(session, token, "regenerated", &mut summary.violations);
                    if !session.ledger().is_empty() {
                        summary
                            .violations
                            .push(format!("round {round}: ledger survived regeneration"));
                    }
                    monitor = FieldMonitor::new(round, session.program());
                    token = session.start()?;
                }
                _ => {}
            }
        };

        expect_stale(session, token, "completed", &mut summary.violations);
        if let SettleOutcome::Stale = session.settle(ticket) {
            summary
                .violations
                .push(format!("round {round}: settle ticket rejected"));
        }

        let results = session.results_for(round).to_vec();
        check_results(
            round,
            &results,
            self.config.field_size,
            &mut summary.violations,
        );
        Ok(RoundSummary {
            round,
            distance_m: self.config.distance_for(round),
            ticks,
            elapsed_ms: session.clock_ms() - started_at,
            results,
            condition_lost: condition_before
                .saturating_sub(roster_condition(session.roster().horses())),
        })
    }

    /// Race `plan` from `seed` on the real-time driver.
    ///
    /// Interruptions are injected from a separate task after the configured
    /// number of tick periods.
    ///
    /// # Errors
    ///
    /// Fails when the session cannot be built, a round cannot be started or a
    /// settle is superseded.
    pub async fn run_plan_realtime(&self, plan: &RacePlan, seed: u64) -> Result<RaceSummary> {
        let session =
            RaceSession::new(self.config.clone(), seed).context("invalid race config")?;
        let mut summary = RaceSummary::new(seed, session.roster().horses());
        let (driver, _updates) = RaceDriver::new(session);
        let tick = self.config.tick_period();

        for _ in 0..plan.rounds {
            let round = driver.with_session(|session| -> Result<Round, RaceError> {
                session.generate_program()?;
                Ok(session.round())
            })?;
            let before = driver.snapshot();
            let mut regenerated = false;

            loop {
                let interruption = plan.interruption.filter(|interruption| {
                    !(regenerated && matches!(interruption, Interruption::RegenerateAfter(_)))
                });
                let interrupter = interruption
                    .map(|interruption| spawn_interruption(driver.clone(), interruption, tick));
                let outcome = driver.run_round().await?;

                let acted = match interrupter {
                    Some(handle) => {
                        handle.abort();
                        handle.await.unwrap_or(false)
                    }
                    None => false,
                };
                match interruption {
                    Some(Interruption::PauseEvery(_)) if acted => summary.pauses += 1,
                    Some(Interruption::RegenerateAfter(_)) if acted => {
                        summary.regenerations += 1;
                        regenerated = true;
                    }
                    _ => {}
                }

                match outcome {
                    DriveOutcome::Completed { .. } => break,
                    DriveOutcome::Cancelled => debug!("round {round} interrupted; resuming"),
                    DriveOutcome::Superseded { round } => {
                        bail!("round {round} settle was superseded")
                    }
                }
            }

            let after = driver.snapshot();
            let results = after.results_per_round[round].clone();
            check_results(
                round,
                &results,
                self.config.field_size,
                &mut summary.violations,
            );
            let elapsed_ms = after.clock_ms - before.clock_ms;
            let racing_ms = elapsed_ms.saturating_sub(self.config.settle_ms);
            let summary_round = RoundSummary {
                round,
                distance_m: before.distance_m,
                ticks: u32::try_from(racing_ms / self.config.tick_ms).unwrap_or(u32::MAX),
                elapsed_ms,
                results,
                condition_lost: roster_condition(&before.roster)
                    .saturating_sub(roster_condition(&after.roster)),
            };
            self.report_round(&summary_round);
            summary.rounds.push(summary_round);
        }

        let last = driver.snapshot();
        summary.finish(last.round, last.status, &last.roster);
        Ok(summary)
    }

    fn report_round(&self, round: &RoundSummary) {
        debug!(
            "round {} ({}m) finished in {} ticks",
            round.round, round.distance_m, round.ticks
        );
        if !self.verbose {
            return;
        }
        let winner = round
            .results
            .first()
            .map_or("-", |entry| entry.name.as_str());
        println!(
            "  🏇 Round {} ({}m): {} ticks, winner {}",
            round.round,
            round.distance_m,
            round.ticks,
            winner.bright_white()
        );
    }
}

fn spawn_interruption(
    driver: RaceDriver,
    interruption: Interruption,
    tick: Duration,
) -> JoinHandle<bool> {
    tokio::spawn(async move {
        tokio::time::sleep(tick * interruption.ticks().max(1) + tick / 2).await;
        driver.with_session(|session| {
            if session.status() != RaceStatus::Running {
                return false;
            }
            match interruption {
                Interruption::PauseEvery(_) => session.pause(),
                Interruption::RegenerateAfter(_) => session.generate_program().is_ok(),
            }
        })
    })
}

fn expect_stale(
    session: &mut RaceSession,
    token: ClockToken,
    after: &str,
    violations: &mut Vec<String>,
) {
    if session.tick(token) != TickOutcome::Stale {
        violations.push(format!(
            "round {}: clock kept ticking after it was {after}",
            session.round()
        ));
    }
}

fn roster_condition(horses: &[Horse]) -> u32 {
    horses.iter().map(|horse| u32::from(horse.condition)).sum()
}

fn check_results(
    round: Round,
    results: &[ResultEntry],
    field_size: usize,
    violations: &mut Vec<String>,
) {
    if results.len() != field_size {
        violations.push(format!(
            "round {round}: {} results for a field of {field_size}",
            results.len()
        ));
    }
    for (entry, expected) in results.iter().zip(1u8..) {
        if entry.position != expected {
            violations.push(format!(
                "round {round}: {} placed {} at slot {expected}",
                entry.name, entry.position
            ));
        }
    }
}

/// Tracks the field between ticks and flags invariant breaches.
struct FieldMonitor {
    round: Round,
    previous: Vec<RaceHorse>,
}

impl FieldMonitor {
    fn new(round: Round, program: &[RaceHorse]) -> Self {
        Self {
            round,
            previous: program.to_vec(),
        }
    }

    fn check(
        &mut self,
        program: &[RaceHorse],
        ledger: &ResultLedger,
        violations: &mut Vec<String>,
    ) {
        let round = self.round;
        if program.len() != self.previous.len() {
            violations.push(format!(
                "round {round}: field changed from {} to {} horses",
                self.previous.len(),
                program.len()
            ));
        }
        for (before, after) in self.previous.iter().zip(program) {
            if before.horse.id != after.horse.id || before.lane != after.lane {
                violations.push(format!(
                    "round {round}: lane {} changed hands mid-round",
                    before.lane
                ));
            }
            if after.progress < before.progress {
                violations.push(format!(
                    "round {round}: {} regressed from {:.2} to {:.2}",
                    after.horse.name, before.progress, after.progress
                ));
            }
            if before.finished && !after.finished {
                violations.push(format!(
                    "round {round}: {} lost its finish",
                    after.horse.name
                ));
            }
            if after.finished != (after.progress >= 100.0) {
                violations.push(format!(
                    "round {round}: {} finish flag disagrees with progress {:.2}",
                    after.horse.name, after.progress
                ));
            }
        }

        let finished = program.iter().filter(|runner| runner.finished).count();
        if ledger.len() != finished {
            violations.push(format!(
                "round {round}: ledger holds {} entries for {finished} finishers",
                ledger.len()
            ));
        }
        self.previous = program.to_vec();
    }
}
