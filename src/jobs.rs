//! Background reconciliation.
//!
//! [`AbsenceSweeper`] runs the absence sweep on a fixed interval until its
//! cancellation token fires. The sweep itself is idempotent, so ticks that
//! find nothing to do are harmless.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, EngineResult};
use crate::services::{AttendanceService, SweepReport};

/// Periodic driver for [`AttendanceService::mark_absentees`].
pub struct AbsenceSweeper {
    service: Arc<AttendanceService>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl AbsenceSweeper {
    /// Creates a sweeper; call [`AbsenceSweeper::run`] on a tokio runtime.
    pub fn new(
        service: Arc<AttendanceService>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            interval,
            shutdown,
        }
    }

    /// Runs one sweep off the async executor.
    pub async fn sweep_once(&self) -> EngineResult<SweepReport> {
        let service = self.service.clone();
        match tokio::task::spawn_blocking(move || service.mark_absentees()).await {
            Ok(result) => result,
            Err(join_error) => Err(EngineError::Internal {
                message: format!("absence sweep task failed: {}", join_error),
            }),
        }
    }

    /// Sweeps on every tick until cancelled.
    ///
    /// Failures are logged and the loop keeps going.
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Absence sweeper started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::error!(error = %e, "Absence sweep failed");
                    }
                }
            }
        }

        tracing::info!("Absence sweeper stopped");
    }
}
