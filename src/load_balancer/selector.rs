//! Latency-first target selection.

use crate::health::state::HealthState;
use crate::load_balancer::endpoint::Endpoint;

/// Pick the endpoint the next request should go to.
///
/// Returns the fastest reachable endpoint of the latest ranking, or the
/// fallback when no monitored endpoint was reachable. Never blocks.
pub fn select_target(health: &HealthState) -> Endpoint {
    let ranking = health.snapshot();
    match ranking.fastest() {
        Some(endpoint) => endpoint.clone(),
        None => health.fallback().clone(),
    }
}
