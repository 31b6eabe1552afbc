//! Real-time clock driver built on tokio timers.
//!
//! The driver shares one [`RaceSession`] behind a mutex, runs ticks on a fixed
//! interval, waits out the settle delay, and publishes a [`RaceSnapshot`] after
//! every mutation. The session lock is never held across an await point.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::RaceError;
use crate::round::Round;
use crate::session::{
    ClockToken, RaceSession, RaceSnapshot, SettleOutcome, StartOutcome, TickOutcome,
};

/// How a driven round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The round finished and the session moved on to `next`.
    Completed { round: Round, next: Round },
    /// The clock was halted (pause, regeneration or reset) while ticking.
    Cancelled,
    /// The round finished but its settle was superseded during the delay.
    Superseded { round: Round },
}

#[derive(Debug, Clone)]
pub struct RaceDriver {
    session: Arc<Mutex<RaceSession>>,
    updates: Arc<watch::Sender<RaceSnapshot>>,
}

impl RaceDriver {
    /// Wrap a session, returning the driver and a snapshot subscription.
    #[must_use]
    pub fn new(session: RaceSession) -> (Self, watch::Receiver<RaceSnapshot>) {
        let (tx, rx) = watch::channel(session.snapshot());
        let driver = Self {
            session: Arc::new(Mutex::new(session)),
            updates: Arc::new(tx),
        };
        (driver, rx)
    }

    /// Additional snapshot subscription.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RaceSnapshot> {
        self.updates.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, RaceSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the session and publish the resulting snapshot.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut RaceSession) -> R) -> R {
        let mut session = self.lock();
        let out = f(&mut session);
        self.updates.send_replace(session.snapshot());
        out
    }

    /// Current snapshot without mutating the session.
    #[must_use]
    pub fn snapshot(&self) -> RaceSnapshot {
        self.lock().snapshot()
    }

    /// Start (or resume) the current round and drive it until it settles or is halted.
    ///
    /// Calling this while the clock already runs pauses it instead, mirroring the
    /// start/pause toggle, and returns [`DriveOutcome::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns an error when the round cannot be started.
    pub async fn run_round(&self) -> Result<DriveOutcome, RaceError> {
        match self.with_session(RaceSession::start_or_pause)? {
            StartOutcome::Started(token) => Ok(self.drive(token).await),
            StartOutcome::Paused => Ok(DriveOutcome::Cancelled),
        }
    }

    /// Tick with `token` on the configured period until the token goes stale or
    /// the round completes and settles.
    pub async fn drive(&self, token: ClockToken) -> DriveOutcome {
        let (period, settle_delay) = {
            let session = self.lock();
            (
                session.config().tick_period(),
                session.config().settle_delay(),
            )
        };
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match self.with_session(|session| session.tick(token)) {
                TickOutcome::Stale => {
                    debug!("driver stopping: clock halted");
                    return DriveOutcome::Cancelled;
                }
                TickOutcome::Advanced(_) => {}
                TickOutcome::RoundComplete { ticket, .. } => {
                    time::sleep(settle_delay).await;
                    return match self.with_session(|session| session.settle(ticket)) {
                        SettleOutcome::Advanced { completed, next } => DriveOutcome::Completed {
                            round: completed,
                            next,
                        },
                        SettleOutcome::Stale => DriveOutcome::Superseded {
                            round: ticket.round(),
                        },
                    };
                }
            }
        }
    }
}
