//! Passive health checking (forwarding failure feedback).
//!
//! # Responsibilities
//! - Observe failed forwarding attempts reported by the proxy handler
//! - Tolerate short bursts of failures
//! - Trigger an out-of-cycle probe once the tolerance is used up, at most
//!   `recheck_max` times per periodic window
//!
//! # Design Decisions
//! - The error budget has its own lock, separate from the health state,
//!   so failure reporting never contends with target selection
//! - Rechecks are fire-and-forget: the failing request does not wait
//! - Only the periodic schedule restores the budget

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::health::prober::LatencyProber;

/// Failures tolerated before a recheck is triggered.
pub const TOLERATE_MAX: u32 = 2;
/// Rechecks allowed between two periodic cycles.
pub const RECHECK_MAX: u32 = 2;

/// Starts one supplemental probe cycle without waiting for it.
pub trait RecheckTrigger: Send + Sync {
    fn fire(&self);
}

/// Spawns a detached Tokio task running one prober cycle.
pub struct SpawnRecheck {
    prober: Arc<LatencyProber>,
}

impl SpawnRecheck {
    pub fn new(prober: Arc<LatencyProber>) -> Self {
        Self { prober }
    }
}

impl RecheckTrigger for SpawnRecheck {
    fn fire(&self) {
        let prober = self.prober.clone();
        tokio::spawn(async move {
            prober.run_cycle().await;
        });
    }
}

/// Remaining failure tolerance and recheck allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorBudget {
    pub tolerate: u32,
    pub recheck: u32,
}

/// Throttles error-driven rechecks.
pub struct ErrorMonitor {
    budget: Mutex<ErrorBudget>,
    tolerate_max: u32,
    recheck_max: u32,
    trigger: Arc<dyn RecheckTrigger>,
}

impl ErrorMonitor {
    pub fn new(tolerate_max: u32, recheck_max: u32, trigger: Arc<dyn RecheckTrigger>) -> Self {
        Self {
            budget: Mutex::new(ErrorBudget {
                tolerate: tolerate_max,
                recheck: recheck_max,
            }),
            tolerate_max,
            recheck_max,
            trigger,
        }
    }

    /// Record one failed forwarding attempt.
    ///
    /// Returns true if this failure fired a recheck.
    pub fn report_failure(&self) -> bool {
        let fire = {
            let mut budget = self.lock();
            budget.tolerate = budget.tolerate.saturating_sub(1);
            if budget.tolerate == 0 && budget.recheck > 0 {
                budget.recheck -= 1;
                budget.tolerate = self.tolerate_max;
                true
            } else {
                false
            }
        };

        if fire {
            tracing::info!("Re-checking host latency");
            self.trigger.fire();
        }
        fire
    }

    /// Restore both counters to their maxima. Called by the periodic schedule.
    pub fn reset(&self) {
        let mut budget = self.lock();
        budget.tolerate = self.tolerate_max;
        budget.recheck = self.recheck_max;
    }

    /// Current counters.
    pub fn budget(&self) -> ErrorBudget {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, ErrorBudget> {
        self.budget.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts rechecks instead of probing.
    #[derive(Default)]
    pub(crate) struct CountingTrigger {
        pub(crate) fired: AtomicUsize,
    }

    impl RecheckTrigger for CountingTrigger {
        fn fire(&self) {
            self.fired.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn monitor() -> (ErrorMonitor, Arc<CountingTrigger>) {
        let trigger = Arc::new(CountingTrigger::default());
        (ErrorMonitor::new(TOLERATE_MAX, RECHECK_MAX, trigger.clone()), trigger)
    }

    #[test]
    fn test_two_failures_fire_one_recheck() {
        let (monitor, trigger) = monitor();

        assert!(!monitor.report_failure());
        assert_eq!(trigger.fired.load(Ordering::SeqCst), 0);

        assert!(monitor.report_failure());
        assert_eq!(trigger.fired.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.budget(), ErrorBudget { tolerate: 2, recheck: 1 });
    }

    #[test]
    fn test_recheck_budget_exhausts() {
        let (monitor, trigger) = monitor();

        for _ in 0..4 {
            monitor.report_failure();
        }
        assert_eq!(trigger.fired.load(Ordering::SeqCst), 2);
        assert_eq!(monitor.budget(), ErrorBudget { tolerate: 2, recheck: 0 });

        for _ in 0..10 {
            assert!(!monitor.report_failure());
        }
        assert_eq!(trigger.fired.load(Ordering::SeqCst), 2);
        assert_eq!(monitor.budget(), ErrorBudget { tolerate: 0, recheck: 0 });
    }

    #[test]
    fn test_reset_restores_maxima() {
        let (monitor, trigger) = monitor();
        for _ in 0..7 {
            monitor.report_failure();
        }

        monitor.reset();
        assert_eq!(monitor.budget(), ErrorBudget { tolerate: TOLERATE_MAX, recheck: RECHECK_MAX });

        monitor.report_failure();
        assert!(monitor.report_failure());
        assert_eq!(trigger.fired.load(Ordering::SeqCst), 3);

        // Resetting a partially used budget also restores both counters.
        monitor.report_failure();
        monitor.reset();
        assert_eq!(monitor.budget(), ErrorBudget { tolerate: TOLERATE_MAX, recheck: RECHECK_MAX });
    }

    #[test]
    fn test_counters_never_increase_between_resets() {
        let monitor = ErrorMonitor::new(3, 1, Arc::new(CountingTrigger::default()));
        let mut last = monitor.budget();
        for _ in 0..10 {
            monitor.report_failure();
            let now = monitor.budget();
            assert!(now.recheck <= last.recheck);
            last = now;
        }
        assert_eq!(last.recheck, 0);
    }

    #[test]
    fn test_concurrent_failures_respect_budget() {
        let (monitor, trigger) = monitor();
        let monitor = Arc::new(monitor);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let monitor = monitor.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        monitor.report_failure();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(trigger.fired.load(Ordering::SeqCst), RECHECK_MAX as usize);
    }

    #[tokio::test]
    async fn test_spawned_recheck_runs_a_cycle() {
        use crate::health::prober::tests::ScriptedDialer;
        use crate::health::state::HealthState;
        use crate::load_balancer::endpoint::Endpoint;
        use std::time::Duration;

        let dialer = Arc::new(ScriptedDialer::default());
        dialer.set("a:80", Some(Duration::from_millis(1)));
        let health = Arc::new(HealthState::new(
            vec![Endpoint::parse("a:80").unwrap()],
            Endpoint::parse("localhost:80").unwrap(),
        ));
        let prober = Arc::new(LatencyProber::with_dialer(health.clone(), dialer.clone(), Duration::from_secs(2)));
        let monitor = ErrorMonitor::new(1, 1, Arc::new(SpawnRecheck::new(prober)));

        assert!(monitor.report_failure());

        for _ in 0..100 {
            if health.is_available() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(health.is_available());
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 1);
    }
}
