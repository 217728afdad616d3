//! Fixed-interval, non-overlapping trigger for sync runs.

use std::future::Future;
use std::time::Duration;

use siger_config::shared::ScheduleConfig;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::concurrency::shutdown::{ShutdownRx, is_shutdown_requested, wait_for_shutdown};

/// Shortest period the scheduler accepts.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Invokes a job at a fixed period until shutdown is requested.
///
/// The job is awaited to completion before the next tick is awaited, so two runs
/// never overlap. A run that outlasts the period delays the next one instead of
/// queueing extra runs. Shutdown is only observed between runs.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    period: Duration,
    run_on_start: bool,
}

impl Scheduler {
    /// Creates a scheduler. A zero `period` is raised to one millisecond.
    pub fn new(period: Duration, run_on_start: bool) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
            run_on_start,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.interval(), config.run_on_start)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs `job` on every tick until `shutdown_rx` signals shutdown.
    ///
    /// Returns the number of completed runs.
    pub async fn run<F, Fut>(&self, mut job: F, mut shutdown_rx: ShutdownRx) -> usize
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let first_tick = if self.run_on_start {
            Instant::now()
        } else {
            Instant::now() + self.period
        };
        let mut interval = interval_at(first_tick, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            period_secs = self.period.as_secs(),
            run_on_start = self.run_on_start,
            "scheduler started"
        );

        let mut runs = 0;
        while !is_shutdown_requested(&shutdown_rx) {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut shutdown_rx) => break,
                _ = interval.tick() => {}
            }

            debug!(run = runs + 1, "scheduled run triggered");
            job().await;
            runs += 1;
        }

        info!(runs, "scheduler stopped");

        runs
    }
}
