//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated configuration into endpoints and shared state
//! - Wire prober, error monitor and HTTP server together
//! - Run the first probe cycle before accepting traffic
//! - Start the periodic health monitor
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when a ranking exists)

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, ProxyConfig};
use crate::health::{Dialer, ErrorMonitor, HealthMonitor, HealthState, LatencyProber, SpawnRecheck, TcpDialer};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::load_balancer::endpoint::{AddressError, Endpoint};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("address: {0}")]
    Address(#[from] AddressError),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// All long-lived subsystems of a running proxy.
pub struct Proxy {
    config: ProxyConfig,
    health: Arc<HealthState>,
    prober: Arc<LatencyProber>,
    errors: Arc<ErrorMonitor>,
}

impl Proxy {
    /// Build the proxy with a plain TCP dialer.
    pub fn build(config: ProxyConfig) -> Result<Self, StartupError> {
        Self::with_dialer(config, Arc::new(TcpDialer))
    }

    /// Build the proxy with a custom dialer for latency probes.
    pub fn with_dialer(config: ProxyConfig, dialer: Arc<dyn Dialer>) -> Result<Self, StartupError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let endpoints = config
            .backends
            .iter()
            .map(|addr| Endpoint::parse(addr))
            .collect::<Result<Vec<_>, _>>()?;
        let fallback = Endpoint::parse(&config.fallback)?;

        let health = Arc::new(HealthState::new(endpoints, fallback));
        let prober = Arc::new(LatencyProber::with_dialer(
            health.clone(),
            dialer,
            config.health_check.dial_timeout,
        ));
        let errors = Arc::new(ErrorMonitor::new(
            config.health_check.tolerate_max,
            config.health_check.recheck_max,
            Arc::new(SpawnRecheck::new(prober.clone())),
        ));

        Ok(Self {
            config,
            health,
            prober,
            errors,
        })
    }

    pub fn health(&self) -> &Arc<HealthState> {
        &self.health
    }

    pub fn errors(&self) -> &Arc<ErrorMonitor> {
        &self.errors
    }

    /// Bind the configured address and serve until `shutdown` fires.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), StartupError> {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| StartupError::Bind { address, source })?;
        self.serve(listener, shutdown).await
    }

    /// Probe once, start the health monitor, then serve on `listener`.
    pub async fn serve(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), StartupError> {
        self.prober.run_cycle().await;

        let monitor = HealthMonitor::new(
            self.prober.clone(),
            self.errors.clone(),
            self.config.health_check.interval,
        );
        tokio::spawn(monitor.run(shutdown.subscribe()));

        let server = HttpServer::new(&self.config.timeouts, self.health, self.errors);
        server.run(listener, shutdown.subscribe()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_defaults() {
        let proxy = Proxy::build(ProxyConfig::default()).unwrap();
        let ranking = proxy.health().snapshot();
        assert_eq!(ranking.ranked.len(), 2);
        assert!(!ranking.available);
        assert_eq!(proxy.health().fallback().address, "localhost:80");
    }

    #[test]
    fn test_build_rejects_bad_address() {
        let mut config = ProxyConfig::default();
        config.fallback = "localhost:80/x".into();
        assert!(matches!(Proxy::build(config), Err(StartupError::Config(ConfigError::Validation(_)))));
    }

    #[test]
    fn test_build_rejects_empty_backends() {
        let mut config = ProxyConfig::default();
        config.backends.clear();
        assert!(Proxy::build(config).is_err());
    }
}
