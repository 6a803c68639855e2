//! Periodic ingestion scheduler
//!
//! Runs one cycle immediately and then one per interval. At most one cycle
//! is in flight: a trigger that arrives while a cycle runs is skipped, not
//! queued. Manual triggers go through the same guard as timer ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::cycle::{CycleReport, Ingestor};

/// Default cycle period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Result of asking the scheduler to run a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Completed(CycleReport),
    /// Another cycle was already running
    Skipped,
}

impl TriggerOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            TriggerOutcome::Completed(report) => Some(report),
            TriggerOutcome::Skipped => None,
        }
    }
}

pub struct Scheduler {
    ingestor: Ingestor,
    interval: Duration,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the cycle ends, even on panic.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Scheduler {
    pub fn new(ingestor: Ingestor, interval: Duration) -> Self {
        Self {
            ingestor,
            interval,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one cycle now unless one is already in flight.
    pub async fn trigger(&self) -> TriggerOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Ingestion cycle already running, skipping trigger");
            return TriggerOutcome::Skipped;
        }
        let _guard = FlightGuard(&self.in_flight);
        TriggerOutcome::Completed(self.ingestor.run_cycle().await)
    }

    /// Start the timer loop. The first cycle runs immediately; the loop
    /// exits when `shutdown` flips to `true` or its sender is dropped.
    /// A cycle already in flight is left to finish on its own task.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_secs = self.interval.as_secs(), "Ingestion scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let scheduler = Arc::clone(&self);
                        tokio::spawn(async move {
                            if let TriggerOutcome::Skipped = scheduler.trigger().await {
                                info!("Previous ingestion cycle still running, tick skipped");
                            }
                        });
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Ingestion scheduler stopped");
        })
    }
}

/// Log a scheduler task that ended abnormally.
pub async fn join_scheduler(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        error!(error = %e, "Ingestion scheduler task failed");
    }
}
