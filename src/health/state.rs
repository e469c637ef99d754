//! Shared health state.
//!
//! # Responsibilities
//! - Hold the latest ranking of endpoints and the availability flag
//! - Hold the fallback endpoint (never probed, never mutated)
//! - Publish new rankings atomically for concurrent readers
//!
//! # Design Decisions
//! - A ranking is an immutable snapshot; readers take the whole `Arc` at once,
//!   so a concurrent reader sees either the old or the new ranking in full
//! - Publishing swaps one pointer; readers never wait on network probing
//! - Only the prober publishes

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::load_balancer::endpoint::Endpoint;

/// One published probe outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    /// Endpoints sorted ascending by latency, unreachable last.
    pub ranked: Vec<Endpoint>,
    /// True iff at least one endpoint in `ranked` is reachable.
    pub available: bool,
}

impl Ranking {
    /// Build a ranking from measured endpoints.
    ///
    /// The sort is stable, so ties keep their previous relative order.
    pub fn from_measurements(mut endpoints: Vec<Endpoint>) -> Self {
        endpoints.sort_by(|a, b| a.latency.cmp(&b.latency));
        let available = endpoints.iter().any(Endpoint::is_reachable);
        Self {
            ranked: endpoints,
            available,
        }
    }

    /// The fastest reachable endpoint, if any.
    pub fn fastest(&self) -> Option<&Endpoint> {
        if self.available {
            self.ranked.first()
        } else {
            None
        }
    }
}

/// Ranking, availability and fallback shared by the prober and request handlers.
#[derive(Debug)]
pub struct HealthState {
    current: ArcSwap<Ranking>,
    fallback: Endpoint,
}

impl HealthState {
    /// Create the state for the configured endpoints.
    ///
    /// Until the first probe publishes, every endpoint is unreachable and
    /// `available` is false.
    pub fn new(endpoints: Vec<Endpoint>, fallback: Endpoint) -> Self {
        Self {
            current: ArcSwap::from_pointee(Ranking::from_measurements(endpoints)),
            fallback,
        }
    }

    /// Take a consistent snapshot of the current ranking.
    pub fn snapshot(&self) -> Arc<Ranking> {
        self.current.load_full()
    }

    /// Replace the current ranking.
    pub fn publish(&self, ranking: Ranking) {
        self.current.store(Arc::new(ranking));
    }

    /// The configured fallback endpoint.
    pub fn fallback(&self) -> &Endpoint {
        &self.fallback
    }

    /// Availability flag of the latest ranking.
    pub fn is_available(&self) -> bool {
        self.current.load().available
    }
}
