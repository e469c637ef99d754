//! Latency probing.
//!
//! # Responsibilities
//! - Dial every configured endpoint with a bounded timeout
//! - Record connect time, or mark the endpoint unreachable
//! - Rank the results and publish them to the shared health state

use futures_util::future::{join_all, BoxFuture};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{self, Instant};

use crate::health::state::{HealthState, Ranking};
use crate::load_balancer::endpoint::{Endpoint, Latency};

/// Measures how long it takes to open a connection to an address.
pub trait Dialer: Send + Sync {
    /// Connect to `address` within `timeout` and return the elapsed time.
    fn dial<'a>(&'a self, address: &'a str, timeout: Duration) -> BoxFuture<'a, io::Result<Duration>>;
}

/// Plain TCP connect. The stream is dropped as soon as it is established.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    fn dial<'a>(&'a self, address: &'a str, timeout: Duration) -> BoxFuture<'a, io::Result<Duration>> {
        Box::pin(timed_connect(TcpStream::connect(address), timeout))
    }
}

/// Time `connect`, giving up with `TimedOut` once `timeout` has passed.
async fn timed_connect<T>(connect: impl Future<Output = io::Result<T>>, timeout: Duration) -> io::Result<Duration> {
    let start = Instant::now();
    match time::timeout(timeout, connect).await {
        Ok(Ok(_connection)) => Ok(start.elapsed()),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connect timed out after {:?}", timeout),
        )),
    }
}

/// Result of one probe cycle, identical to what was published.
pub type ProbeReport = Ranking;

/// Runs probe cycles against the endpoints held in a [`HealthState`].
pub struct LatencyProber {
    health: Arc<HealthState>,
    dialer: Arc<dyn Dialer>,
    dial_timeout: Duration,
}

impl LatencyProber {
    pub fn with_dialer(health: Arc<HealthState>, dialer: Arc<dyn Dialer>, dial_timeout: Duration) -> Self {
        Self {
            health,
            dialer,
            dial_timeout,
        }
    }

    /// Probe every endpoint once, then publish and return the new ranking.
    ///
    /// Dials run concurrently against the previous ranking's endpoints; the
    /// shared state is only touched once all of them have finished.
    pub async fn run_cycle(&self) -> ProbeReport {
        let previous = self.health.snapshot();

        let probes = previous.ranked.iter().map(|endpoint| self.probe(endpoint));
        let measured = join_all(probes).await;

        let ranking = Ranking::from_measurements(measured);
        self.health.publish(ranking.clone());

        match ranking.fastest() {
            Some(fastest) => tracing::info!(
                endpoint = %fastest,
                latency = %fastest.latency,
                "The fastest is {}",
                fastest
            ),
            None => tracing::warn!(
                fallback = %self.health.fallback(),
                "Fallback enabled: no endpoint reachable"
            ),
        }

        ranking
    }

    async fn probe(&self, endpoint: &Endpoint) -> Endpoint {
        match self.dialer.dial(&endpoint.address, self.dial_timeout).await {
            Ok(elapsed) => {
                tracing::info!(endpoint = %endpoint, latency = ?elapsed, "Latency measured");
                endpoint.with_latency(Latency::Reachable(elapsed))
            }
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Latency check failed");
                endpoint.with_latency(Latency::Unreachable)
            }
        }
    }
}
