//! Round lifecycle controller.
//!
//! `RaceSession` owns the roster, the per-round programs and ledgers, and the
//! simulation clock. Every clock start issues a [`ClockToken`] and every
//! completed round issues a [`SettleTicket`]; both carry the epoch they were
//! issued in, and any pause, regeneration or reset bumps the epoch so stale
//! ticks and settles become no-ops.
use log::{debug, trace, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::{TickReport, run_tick};
use crate::config::RaceConfig;
use crate::error::{RaceConfigError, RaceError};
use crate::ledger::{ResultEntry, ResultLedger};
use crate::program::{RaceHorse, draw_program};
use crate::rng::RngBundle;
use crate::roster::{Horse, Roster};
use crate::round::{Round, RoundTable};
use crate::telemetry::{LeaderTelemetry, Throttle, leader_display_speed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceStatus {
    #[default]
    Idle,
    Running,
    Paused,
    /// Every horse is home; waiting for the settle delay before the next round.
    Finished,
}

/// Permission to tick the clock, valid until the clock is next halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockToken {
    epoch: u64,
}

/// Deferred round advance issued when a round completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTicket {
    epoch: u64,
    round: Round,
    due_ms: u64,
}

impl SettleTicket {
    #[must_use]
    pub const fn round(&self) -> Round {
        self.round
    }

    /// Simulation time at which the round may advance.
    #[must_use]
    pub const fn due_ms(&self) -> u64 {
        self.due_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(ClockToken),
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The token was issued before the clock was last halted.
    Stale,
    Advanced(TickReport),
    RoundComplete {
        report: TickReport,
        ticket: SettleTicket,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The ticket was superseded by a pause, regeneration or reset.
    Stale,
    Advanced { completed: Round, next: Round },
}

/// Result of [`RaceSession::advance_time`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    pub ticks: u32,
    pub completed: Option<Round>,
    pub settled: Option<Round>,
}

/// Result of running one round start to settle with [`RaceSession::run_round`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: Round,
    pub distance_m: u32,
    pub ticks: u32,
    pub elapsed_ms: u64,
    pub results: Vec<ResultEntry>,
    /// Roster condition lost to this round's fatigue.
    pub condition_lost: u32,
}

/// Everything a presentation layer needs to draw the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub seed: u64,
    pub round: Round,
    pub distance_m: u32,
    pub status: RaceStatus,
    pub clock_ms: u64,
    pub program: Vec<RaceHorse>,
    pub results: Vec<ResultEntry>,
    pub programs_per_round: RoundTable<Vec<RaceHorse>>,
    pub results_per_round: RoundTable<Vec<ResultEntry>>,
    pub leader: Option<LeaderTelemetry>,
    pub distance_marker: u32,
    pub roster: Vec<Horse>,
}

#[derive(Debug, Clone)]
pub struct RaceSession {
    config: RaceConfig,
    rng: RngBundle,
    roster: Roster,
    round: Round,
    status: RaceStatus,
    programs: RoundTable<Vec<RaceHorse>>,
    ledger: ResultLedger,
    results: RoundTable<Vec<ResultEntry>>,
    leader: Option<LeaderTelemetry>,
    throttle: Throttle,
    distance_marker: u32,
    epoch: u64,
    clock_ms: u64,
    carry_ms: u64,
    pending_settle: Option<SettleTicket>,
}

impl RaceSession {
    /// Start a session with a freshly generated roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: RaceConfig, seed: u64) -> Result<Self, RaceConfigError> {
        config.validate()?;
        let mut rng = RngBundle::from_user_seed(seed);
        let roster = Roster::generate(&config, rng.roster());
        Ok(Self::assemble(config, rng, roster))
    }

    /// Start a session seeded from entropy; the seed stays available via [`Self::seed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_entropy(config: RaceConfig) -> Result<Self, RaceConfigError> {
        let seed = RngBundle::from_entropy().seed();
        Self::new(config, seed)
    }

    /// Start a session around an externally supplied list of horses.
    ///
    /// A roster smaller than the field is accepted here and surfaces as
    /// [`RaceError::RosterTooSmall`] when a program is drawn.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a condition exceeds
    /// 100 or a horse id repeats.
    pub fn with_roster(
        config: RaceConfig,
        horses: Vec<Horse>,
        seed: u64,
    ) -> Result<Self, RaceConfigError> {
        config.validate()?;
        let roster = Roster::from_horses(horses)?;
        Ok(Self::assemble(config, RngBundle::from_user_seed(seed), roster))
    }

    fn assemble(config: RaceConfig, rng: RngBundle, roster: Roster) -> Self {
        Self {
            ledger: ResultLedger::with_capacity(config.field_size),
            throttle: Throttle::new(config.telemetry_throttle_ms),
            config,
            rng,
            roster,
            round: Round::FIRST,
            status: RaceStatus::Idle,
            programs: RoundTable::default(),
            results: RoundTable::default(),
            leader: None,
            distance_marker: 0,
            epoch: 0,
            clock_ms: 0,
            carry_ms: 0,
            pending_settle: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RaceConfig {
        &self.config
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub const fn round(&self) -> Round {
        self.round
    }

    #[must_use]
    pub const fn status(&self) -> RaceStatus {
        self.status
    }

    /// Target distance of the current round in meters.
    #[must_use]
    pub fn current_distance(&self) -> u32 {
        self.config.distance_for(self.round)
    }

    /// Program of the current round; empty until one is generated.
    #[must_use]
    pub fn program(&self) -> &[RaceHorse] {
        &self.programs[self.round]
    }

    #[must_use]
    pub fn program_for(&self, round: Round) -> &[RaceHorse] {
        &self.programs[round]
    }

    /// Live ledger of the current round.
    #[must_use]
    pub const fn ledger(&self) -> &ResultLedger {
        &self.ledger
    }

    /// Final results archived when `round` last completed.
    #[must_use]
    pub fn results_for(&self, round: Round) -> &[ResultEntry] {
        &self.results[round]
    }

    #[must_use]
    pub const fn leader(&self) -> Option<&LeaderTelemetry> {
        self.leader.as_ref()
    }

    #[must_use]
    pub const fn distance_marker(&self) -> u32 {
        self.distance_marker
    }

    /// Elapsed simulation time in milliseconds.
    #[must_use]
    pub const fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    #[must_use]
    pub const fn pending_settle(&self) -> Option<SettleTicket> {
        self.pending_settle
    }

    #[must_use]
    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            seed: self.seed(),
            round: self.round,
            distance_m: self.current_distance(),
            status: self.status,
            clock_ms: self.clock_ms,
            program: self.program().to_vec(),
            results: self.ledger.entries().to_vec(),
            programs_per_round: self.programs.clone(),
            results_per_round: self.results.clone(),
            leader: self.leader.clone(),
            distance_marker: self.distance_marker,
            roster: self.roster.horses().to_vec(),
        }
    }

    /// Draw a fresh program for the current round.
    ///
    /// Halts a running clock and discards the round's progress and ledger.
    /// Conditions already committed to the roster are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::RosterTooSmall`] when the roster cannot fill the field;
    /// the session is left unchanged in that case.
    pub fn generate_program(&mut self) -> Result<&[RaceHorse], RaceError> {
        let program = draw_program(&self.roster, self.config.field_size, self.rng.program())?;
        self.halt_clock();
        debug!(
            "round {} program drawn: lanes {:?}",
            self.round,
            program
                .iter()
                .map(|runner| runner.horse.id)
                .collect::<Vec<_>>()
        );
        self.programs[self.round] = program;
        self.results[self.round].clear();
        self.clear_round_display();
        self.status = RaceStatus::Idle;
        Ok(&self.programs[self.round])
    }

    /// Start the clock, or pause it when it is already running.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::NoProgram`] when the current round has no program and
    /// [`RaceError::Settling`] while a completed round waits to advance.
    pub fn start_or_pause(&mut self) -> Result<StartOutcome, RaceError> {
        if self.status == RaceStatus::Running {
            self.pause();
            return Ok(StartOutcome::Paused);
        }
        self.start().map(StartOutcome::Started)
    }

    /// Start or resume the clock, returning the token for the running clock.
    ///
    /// Resuming keeps every horse's progress, lane and finish state.
    ///
    /// # Errors
    ///
    /// See [`Self::start_or_pause`].
    pub fn start(&mut self) -> Result<ClockToken, RaceError> {
        if self.programs[self.round].is_empty() {
            return Err(RaceError::NoProgram { round: self.round });
        }
        match self.status {
            RaceStatus::Running => Ok(ClockToken { epoch: self.epoch }),
            RaceStatus::Finished => Err(RaceError::Settling { round: self.round }),
            RaceStatus::Idle | RaceStatus::Paused => {
                if self.status == RaceStatus::Idle {
                    self.roster.refresh_conditions(&mut self.programs[self.round]);
                }
                self.epoch += 1;
                self.carry_ms = 0;
                self.status = RaceStatus::Running;
                debug!("round {} clock started (epoch {})", self.round, self.epoch);
                Ok(ClockToken { epoch: self.epoch })
            }
        }
    }

    /// Halt a running clock without touching progress. Returns whether it was running.
    pub fn pause(&mut self) -> bool {
        if self.status != RaceStatus::Running {
            return false;
        }
        self.halt_clock();
        self.status = RaceStatus::Paused;
        debug!("round {} paused at {}ms", self.round, self.clock_ms);
        true
    }

    /// Advance the current round by one tick.
    pub fn tick(&mut self, token: ClockToken) -> TickOutcome {
        if self.status != RaceStatus::Running || token.epoch != self.epoch {
            warn!(
                "ignoring stale tick (token epoch {}, current {})",
                token.epoch, self.epoch
            );
            return TickOutcome::Stale;
        }

        self.clock_ms += self.config.tick_ms;
        let round = self.round;
        let distance = self.current_distance();
        let report = run_tick(
            &mut self.programs[round],
            &mut self.ledger,
            &self.config.pace,
            &self.config.telemetry,
            distance,
            self.rng.pace(),
        );
        self.distance_marker = report.distance_marker;
        self.observe_leader(&report, distance);
        for entry in &report.finishers {
            debug!("round {round}: {} finished {}", entry.name, entry.position);
        }

        if report.all_finished {
            let ticket = self.complete_round();
            return TickOutcome::RoundComplete { report, ticket };
        }
        TickOutcome::Advanced(report)
    }

    fn observe_leader(&mut self, report: &TickReport, distance: u32) {
        let Some(leader) = report.leader.as_ref() else {
            return;
        };
        if leader.progress >= self.config.telemetry.leader_speed_cutoff
            || !self.throttle.try_emit(self.clock_ms)
        {
            return;
        }
        let speed = leader_display_speed(leader.delta, distance, self.config.tick_ms);
        trace!("leader {} at {:.2}% ({speed})", leader.name, leader.progress);
        self.leader = Some(LeaderTelemetry {
            name: leader.name.clone(),
            speed,
        });
    }

    fn complete_round(&mut self) -> SettleTicket {
        self.halt_clock();
        self.status = RaceStatus::Finished;

        let round = self.round;
        let max_fatigue = self.config.condition.max_fatigue.max(1);
        let fatigue = self.rng.fatigue();
        for runner in &mut self.programs[round] {
            let loss = fatigue.gen_range(0..max_fatigue);
            runner.horse.condition = runner.horse.condition.saturating_sub(loss);
        }
        self.roster.commit_conditions(&self.programs[round]);
        self.results[round] = self.ledger.entries().to_vec();

        let ticket = SettleTicket {
            epoch: self.epoch,
            round,
            due_ms: self.clock_ms + self.config.settle_ms,
        };
        self.pending_settle = Some(ticket);
        debug!(
            "round {round} complete at {}ms; settling until {}ms",
            self.clock_ms, ticket.due_ms
        );
        ticket
    }

    /// Finish the settle sequence: rest the field, clear the ledger and advance the round.
    pub fn settle(&mut self, ticket: SettleTicket) -> SettleOutcome {
        if self.status != RaceStatus::Finished || self.pending_settle != Some(ticket) {
            debug!("ignoring superseded settle for round {}", ticket.round);
            return SettleOutcome::Stale;
        }
        self.pending_settle = None;
        self.clock_ms = self.clock_ms.max(ticket.due_ms);
        for runner in &mut self.programs[ticket.round] {
            runner.rest();
        }
        self.clear_round_display();
        if ticket.round.is_last() {
            debug!("card complete; wrapping to round {}", Round::FIRST);
        }
        self.round = self.round.next();
        self.roster.refresh_conditions(&mut self.programs[self.round]);
        self.status = RaceStatus::Idle;
        debug!("round {} settled; next round {}", ticket.round, self.round);
        SettleOutcome::Advanced {
            completed: ticket.round,
            next: self.round,
        }
    }

    /// Drive the session forward by `elapsed_ms` of simulation time.
    ///
    /// Runs whole ticks while the clock is running (sub-tick remainders carry
    /// over) and fires a pending settle once its delay has elapsed. Stops at
    /// the first idle or paused state.
    pub fn advance_time(&mut self, elapsed_ms: u64) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        let mut left_ms = elapsed_ms;
        loop {
            match self.status {
                RaceStatus::Running => {
                    let available = self.carry_ms + left_ms;
                    if available < self.config.tick_ms {
                        self.carry_ms = available;
                        break;
                    }
                    left_ms = available - self.config.tick_ms;
                    self.carry_ms = 0;
                    let token = ClockToken { epoch: self.epoch };
                    report.ticks += 1;
                    if let TickOutcome::RoundComplete { ticket, .. } = self.tick(token) {
                        report.completed = Some(ticket.round);
                    }
                }
                RaceStatus::Finished => {
                    let Some(ticket) = self.pending_settle else {
                        break;
                    };
                    let remaining = ticket.due_ms.saturating_sub(self.clock_ms);
                    if left_ms < remaining {
                        self.clock_ms += left_ms;
                        break;
                    }
                    left_ms -= remaining;
                    self.clock_ms += remaining;
                    if let SettleOutcome::Advanced { completed, .. } = self.settle(ticket) {
                        report.settled = Some(completed);
                    }
                }
                RaceStatus::Idle | RaceStatus::Paused => break,
            }
        }
        report
    }

    /// Run the current round from start to settle without real-time delays.
    ///
    /// # Errors
    ///
    /// See [`Self::start`].
    pub fn run_round(&mut self) -> Result<RoundSummary, RaceError> {
        let round = self.round;
        let condition_before = self.roster.total_condition();
        let started_at = self.clock_ms;
        let token = self.start()?;

        let mut ticks = 0u32;
        let ticket = loop {
            ticks += 1;
            match self.tick(token) {
                TickOutcome::Advanced(_) => {}
                TickOutcome::RoundComplete { ticket, .. } => break ticket,
                TickOutcome::Stale => return Err(RaceError::ClockHalted { round }),
            }
        };
        let condition_lost = condition_before.saturating_sub(self.roster.total_condition());
        self.settle(ticket);

        Ok(RoundSummary {
            round,
            distance_m: self.config.distance_for(round),
            ticks,
            elapsed_ms: self.clock_ms - started_at,
            results: self.results[round].clone(),
            condition_lost,
        })
    }

    /// Clear every round's programs and results; the round counter and roster are kept.
    pub fn reset(&mut self) {
        self.halt_clock();
        self.programs.clear();
        self.results.clear();
        self.clear_round_display();
        self.status = RaceStatus::Idle;
        debug!("session reset at round {}", self.round);
    }

    /// Replace the roster with freshly generated horses and clear all round state.
    pub fn regenerate_roster(&mut self) -> &Roster {
        self.reset();
        self.roster = Roster::generate(&self.config, self.rng.roster());
        debug!("roster regenerated ({} horses)", self.roster.len());
        &self.roster
    }

    fn halt_clock(&mut self) {
        self.epoch += 1;
        self.carry_ms = 0;
        self.pending_settle = None;
    }

    fn clear_round_display(&mut self) {
        self.ledger.clear();
        self.leader = None;
        self.throttle.reset();
        self.distance_marker = 0;
    }
}
