//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::health::passive::{RECHECK_MAX, TOLERATE_MAX};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Monitored backends, each `host:port`.
    pub backends: Vec<String>,

    /// Used when no monitored backend is reachable (`host:port`).
    pub fallback: String,

    /// Probe schedule and error budget.
    pub health_check: HealthCheckConfig,

    /// Forwarding timeouts.
    pub timeouts: TimeoutConfig,

    /// Log output settings.
    pub logging: LoggingConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            backends: vec![
                "host1.example.com:80".to_string(),
                "host2.example.com:80".to_string(),
            ],
            fallback: "localhost:80".to_string(),
            health_check: HealthCheckConfig::default(),
            timeouts: TimeoutConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listener.host, self.listener.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "localhost", "0.0.0.0").
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

/// Latency probing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Pause between the end of one scheduled cycle and the start of the next.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Upper bound for a single connect attempt.
    #[serde(with = "humantime_serde")]
    pub dial_timeout: Duration,

    /// Forwarding failures tolerated before an extra probe cycle.
    pub tolerate_max: u32,

    /// Extra probe cycles allowed between two scheduled cycles.
    pub recheck_max: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            dial_timeout: Duration::from_secs(2),
            tolerate_max: TOLERATE_MAX,
            recheck_max: RECHECK_MAX,
        }
    }
}

/// Timeout configuration for forwarded requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout towards the selected backend.
    #[serde(with = "humantime_serde")]
    pub connect: Duration,

    /// Time allowed for the backend to return response headers.
    #[serde(with = "humantime_serde")]
    pub request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            request: Duration::from_secs(30),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set.
    pub filter: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "latency_proxy=info,tower_http=info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
