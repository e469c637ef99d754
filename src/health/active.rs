//! Active health checking.
//!
//! # Responsibilities
//! - Run a probe cycle on a fixed schedule
//! - Restore the error budget at the start of every scheduled cycle
//!
//! # Design Decisions
//! - The interval is measured from the end of one cycle to the start of the
//!   next, so slow probes stretch the period instead of overlapping
//! - Error-triggered cycles run outside this loop and never reset the budget

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::health::passive::ErrorMonitor;
use crate::health::prober::LatencyProber;

pub struct HealthMonitor {
    prober: Arc<LatencyProber>,
    errors: Arc<ErrorMonitor>,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(prober: Arc<LatencyProber>, errors: Arc<ErrorMonitor>, interval: Duration) -> Self {
        Self {
            prober,
            errors,
            interval,
        }
    }

    /// Scheduled cycles until shutdown.
    ///
    /// The first cycle is expected to have been run by startup already, so the
    /// loop begins by sleeping.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Health monitor starting");

        loop {
            tokio::select! {
                _ = time::sleep(self.interval) => {
                    self.errors.reset();
                    self.prober.run_cycle().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
