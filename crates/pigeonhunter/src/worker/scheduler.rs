//! Interval-driven pass scheduler.
//!
//! Runs a pass (connect, scan, disconnect) every interval. Passes run on the
//! caller's task one after another, so they never overlap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::email::MailSource;
use crate::pipeline::{PassReport, Pipeline};

/// How often a sleeping scheduler looks at the shutdown flag.
const DEFAULT_SHUTDOWN_POLL: Duration = Duration::from_millis(500);

pub struct Scheduler {
    interval: Duration,
    shutdown_poll: Duration,
    shutdown: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            shutdown_poll: DEFAULT_SHUTDOWN_POLL,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Builds a scheduler from `general.check_interval_minutes`.
    pub fn from_minutes(minutes: u64) -> Self {
        Self::new(Duration::from_secs(minutes.saturating_mul(60)))
    }

    pub fn with_shutdown_poll(mut self, poll: Duration) -> Self {
        self.shutdown_poll = poll;
        self
    }

    /// Flag that stops the loop when set; hand it to a signal handler.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signals the scheduler to stop.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Runs passes until stopped. Returns the number of passes run.
    ///
    /// With `run_initial_scan` set, the first pass starts immediately and the
    /// flag is cleared in the stored config; otherwise the first pass waits
    /// one interval.
    pub async fn run(&self, pipeline: &mut Pipeline, source: &mut dyn MailSource) -> usize {
        info!(
            "Scheduler started, checking every {} minute(s)",
            self.interval.as_secs() / 60
        );
        let mut passes = 0;
        let mut next_run = Instant::now() + self.interval;

        if pipeline.config().general.run_initial_scan && !self.is_stopped() {
            info!("Running initial scan");
            run_once(pipeline, source).await;
            passes += 1;
            if let Err(e) = pipeline.clear_initial_scan() {
                warn!("Could not clear the initial scan flag: {}", e);
            }
            next_run = Instant::now() + self.interval;
        }

        while self.wait_until(next_run).await {
            run_once(pipeline, source).await;
            passes += 1;
            // Overrunning passes start the next one right away
            next_run = (next_run + self.interval).max(Instant::now());
        }

        info!("Scheduler stopping after {} pass(es)", passes);
        if let Err(e) = source.disconnect().await {
            warn!("Error while disconnecting from mail store: {}", e);
        }
        passes
    }

    /// Sleeps until `deadline`, waking up to check the shutdown flag.
    /// Returns `false` if shutdown was requested.
    async fn wait_until(&self, deadline: Instant) -> bool {
        loop {
            if self.is_stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            tokio::time::sleep((deadline - now).min(self.shutdown_poll)).await;
        }
    }
}

/// Runs one connected pass, logging instead of failing.
pub async fn run_once(pipeline: &mut Pipeline, source: &mut dyn MailSource) -> Option<PassReport> {
    match pipeline.run_job(source).await {
        Ok(report) => Some(report),
        Err(e) => {
            error!("Could not reach the mail store, skipping this pass: {}", e);
            None
        }
    }
}
