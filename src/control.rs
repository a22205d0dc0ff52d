use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::error::StartError;
use crate::health::{HealthCheckOutcome, Probe};
use crate::parse::Config;
use crate::runtime::{ProcessHandle, ProcessSpawner, RuntimeJob, SupervisorState};

/// Owns the managed process and the restart policy.
///
/// All reads and writes of the process handle and the failure counter go
/// through one lock, shared with the exit-watcher of the current child.
pub struct Supervisor {
    config: Config,
    state: SupervisorState,
    checker: Arc<dyn Probe>,
}

impl Supervisor {
    pub fn new(config: Config, spawner: Arc<dyn ProcessSpawner>, checker: Arc<dyn Probe>) -> Self {
        let state = Arc::new(Mutex::new(RuntimeJob {
            process: ProcessHandle::new(spawner),
            consecutive_failures: 0,
        }));
        Self { config, state, checker }
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.process.is_running()
    }

    pub async fn pid(&self) -> Option<u32> {
        self.state.lock().await.process.pid()
    }

    pub async fn consecutive_failures(&self) -> u32 {
        self.state.lock().await.consecutive_failures
    }

    pub async fn start(&self) -> Result<u32, StartError> {
        let mut job = self.state.lock().await;
        job.process
            .start(&self.config.command, &self.config.args, &self.state)
    }

    pub async fn stop(&self) {
        self.state.lock().await.process.stop();
    }

    pub async fn restart(&self) {
        let mut job = self.state.lock().await;
        self.restart_locked(&mut job);
    }

    // Stop, relaunch, reset the counter. A failed relaunch is only logged:
    // the next tick sees no process and tries again.
    fn restart_locked(&self, job: &mut RuntimeJob) {
        info!("Restarting app");
        job.process.stop();
        if let Err(e) = job
            .process
            .start(&self.config.command, &self.config.args, &self.state)
        {
            error!(error = %e, "Failed to restart app");
        }
        job.consecutive_failures = 0;
    }

    /*
        @@@
        @check_once();
        . Probes the health URL (outside the lock, it may block up to the probe timeout).
        . Counts a transport failure or bad status, resets the counter on success.
        . A process that is no longer tracked is restarted regardless of the counter.
        . Otherwise restarts once the counter reaches max_failures_before_restart.
    */
    pub async fn check_once(&self) {
        let outcome = self.checker.probe(&self.config.check_url).await;

        let mut job = self.state.lock().await;
        match &outcome {
            HealthCheckOutcome::Success => {
                info!("Health check OK");
                job.consecutive_failures = 0;
            }
            HealthCheckOutcome::TransportFailure(reason) => {
                warn!(error = %reason, "Health check failed");
                job.consecutive_failures += 1;
            }
            HealthCheckOutcome::BadStatus(code) => {
                warn!(status = code, "Health check bad status");
                job.consecutive_failures += 1;
            }
        }

        if !job.process.is_running() {
            warn!("Detected app process not running, restarting");
            self.restart_locked(&mut job);
            return;
        }

        let threshold = self.config.max_failures_before_restart;
        if job.consecutive_failures >= threshold {
            warn!(
                failures = job.consecutive_failures,
                threshold, "Failure threshold reached, restarting app"
            );
            self.restart_locked(&mut job);
        }
    }

    /// Tick forever. The first check runs one interval after the call.
    pub async fn run(&self) {
        let period = self.config.interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_seconds = period.as_secs(), "Health check loop started");
        loop {
            ticker.tick().await;
            self.check_once().await;
        }
    }
}
