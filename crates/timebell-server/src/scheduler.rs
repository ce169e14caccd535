//! The hourly announcement scheduler.
//!
//! Wakes once per period, reads the wall clock once, and dispatches an
//! announcement when the minute is zero and the hour is configured. Missed
//! hours are never replayed.

use chrono::Timelike;
use std::sync::Arc;
use std::time::Duration;
use timebell_store::ConfigStore;
use timebell_types::PlayRequest;
use timebell_voice::Announcer;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Production tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(60);

/// Hour and minute from a single clock read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    pub hour: u8,
    pub minute: u8,
}

impl WallTime {
    pub fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    pub fn is_top_of_hour(self) -> bool {
        self.minute == 0
    }
}

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> WallTime;
}

/// The host's local time zone clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> WallTime {
        let now = chrono::Local::now();
        // hour() < 24 and minute() < 60 always fit in u8.
        WallTime::new(now.hour() as u8, now.minute() as u8)
    }
}

/// Periodic trigger for scheduled announcements.
pub struct Scheduler {
    store: ConfigStore,
    announcer: Arc<dyn Announcer>,
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl Scheduler {
    pub fn new(
        store: ConfigStore,
        announcer: Arc<dyn Announcer>,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> Self {
        Self {
            store,
            announcer,
            clock,
            period,
        }
    }

    /// Evaluates the trigger condition once.
    ///
    /// Returns the hour that was dispatched, if any. Duplicate entries for
    /// the same hour still yield a single dispatch.
    pub fn tick(&self) -> Option<u8> {
        let now = self.clock.now();
        if !now.is_top_of_hour() {
            return None;
        }

        let config = self.store.get();
        if !config.triggers_at(now.hour) {
            tracing::debug!(hour = now.hour, "hour not configured, skipping");
            return None;
        }

        tracing::info!(hour = now.hour, speaker = %config.speaker, "dispatching scheduled announcement");
        self.announcer
            .dispatch(PlayRequest::new(config.speaker, now.hour));
        Some(now.hour)
    }

    /// Ticks until `shutdown` becomes `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if *shutdown.borrow() {
            return;
        }

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            period_seconds = self.period.as_secs_f64(),
            "starting announcement scheduler"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("announcement scheduler stopped");
    }

    /// Runs the scheduler on a background task.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
