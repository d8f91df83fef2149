//! ExpirationSweeper - background service that lapses overdue subscriptions.
//!
//! Periodically runs the expiration sweep: every Active subscription whose
//! window has fully closed transitions to Expired. The sweep is idempotent,
//! so an extra pass after a restart or a manually triggered pass over the
//! same rows is harmless. Failed rows stay Active and are retried on the
//! next pass.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time;

use crate::application::handlers::subscription::{SweepExpiredHandler, SweepReport};
use crate::domain::foundation::DomainError;

/// Configuration for the ExpirationSweeper service.
#[derive(Debug, Clone)]
pub struct ExpirationSweeperConfig {
    /// How often to run a sweep pass.
    pub sweep_interval: Duration,
}

impl Default for ExpirationSweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(3600),
        }
    }
}

impl ExpirationSweeperConfig {
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Background service that runs the expiration sweep on an interval.
///
/// A shared `ExpirationSweeper` never runs two passes at once: a tick that
/// fires while a pass is still in flight is skipped.
pub struct ExpirationSweeper {
    handler: Arc<SweepExpiredHandler>,
    config: ExpirationSweeperConfig,
    in_flight: Mutex<()>,
}

impl ExpirationSweeper {
    pub fn new(handler: Arc<SweepExpiredHandler>) -> Self {
        Self::with_config(handler, ExpirationSweeperConfig::default())
    }

    pub fn with_config(handler: Arc<SweepExpiredHandler>, config: ExpirationSweeperConfig) -> Self {
        Self {
            handler,
            config,
            in_flight: Mutex::new(()),
        }
    }

    /// Run the sweep loop until the shutdown signal is received.
    ///
    /// A sweep error is logged and the loop keeps running; the same rows
    /// are picked up again on the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.sweep_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("expiration sweeper shutting down");
                        return;
                    }
                }

                _ = interval.tick() => {
                    // Single flight: skip the tick if a pass is still running.
                    let Ok(_guard) = self.in_flight.try_lock() else {
                        tracing::debug!("previous sweep pass still running, skipping tick");
                        continue;
                    };
                    match self.sweep_once().await {
                        Ok(report) if report.swept > 0 || report.failed > 0 => {
                            tracing::info!(
                                swept = report.swept,
                                failed = report.failed,
                                "expiration sweep pass finished"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "expiration sweep pass failed");
                        }
                    }
                }
            }
        }
    }

    /// Run exactly one sweep pass.
    pub async fn sweep_once(&self) -> Result<SweepReport, DomainError> {
        self.handler.handle().await
    }
}
