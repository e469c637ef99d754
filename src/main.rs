//! Latency-aware reverse proxy.
//!
//! Forwards every request to whichever configured backend currently has the
//! lowest TCP connect latency, and to a fallback host when none answer.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http::server ──▶ selector ──(snapshot)──▶ health::state
//!                  │                                        ▲
//!                  │ forwarding failure                     │ publish
//!                  ▼                                        │
//!           health::passive ──── recheck (spawned) ──▶ health::prober ──▶ TCP dial
//!                  ▲                                        ▲             backends
//!                  └──── budget reset ── health::active ────┘
//!                                        (every interval)
//! ```

use clap::Parser;

use latency_proxy::config::Cli;
use latency_proxy::lifecycle::{signals, Proxy, Shutdown};
use latency_proxy::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.logging);

    tracing::info!("latency-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.bind_address(),
        backends = ?config.backends,
        fallback = %config.fallback,
        check_interval = ?config.health_check.interval,
        "Configuration loaded"
    );

    let proxy = Proxy::build(config)?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    proxy.run(shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
