//! The schedule loop: one pass immediately, then one per interval.

use std::sync::Arc;
use std::time::Duration;

use dropsweep_remote::FilesClient;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SweepConfig;
use crate::pass;

/// Owns the client handle and config and runs passes on a fixed schedule.
pub struct Sweeper {
    client: Arc<dyn FilesClient>,
    config: SweepConfig,
}

/// Handle returned by [`Sweeper::spawn`] for lifecycle control.
pub struct SweeperHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the loop and await its exit. Cancellation is observed between
    /// passes, so an in-flight pass still runs to completion first.
    pub async fn shutdown(mut self) -> Result<(), tokio::task::JoinError> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(_) => Ok(()),
                Err(err) if err.is_cancelled() => Ok(()),
                Err(err) => Err(err),
            }
        } else {
            Ok(())
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Sweeper {
    pub fn new(client: Arc<dyn FilesClient>, config: SweepConfig) -> Self {
        Self { client, config }
    }

    /// Spawn the schedule loop. The first pass runs immediately; further
    /// passes run once per `period` until the handle cancels the loop. A
    /// pass that overruns the period delays the next tick; missed ticks are
    /// not queued.
    pub fn spawn(self, period: Duration) -> SweeperHandle {
        let cancel = CancellationToken::new();
        let loop_token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(period = ?period, path = %self.config.folder_path, "sweep loop started");
            loop {
                tokio::select! {
                    // Once cancelled, never start another pass even if the
                    // ticker is also ready.
                    biased;
                    _ = loop_token.cancelled() => {
                        info!("sweep loop stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let report = pass::run_sweep(self.client.as_ref(), &self.config).await;
                        info!(
                            listed = report.listed,
                            expired = report.expired,
                            deleted = report.deleted,
                            failed = report.failed,
                            aborted = report.aborted,
                            "sweep finished"
                        );
                        debug!(period = ?period, "next sweep scheduled");
                    }
                }
            }
        });
        SweeperHandle {
            cancel,
            task: Some(task),
        }
    }
}
