//! Command-line flags.
//!
//! Flags override values from the optional config file, which in turn
//! override the built-in defaults.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::{LogFormat, ProxyConfig};
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "latency-proxy")]
#[command(about = "Reverse proxy that forwards to the backend with the lowest connect latency", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on [default: 8080]
    #[arg(long)]
    pub port: Option<u16>,

    /// Interface to listen on [default: localhost]
    #[arg(long)]
    pub listen_host: Option<String>,

    /// Comma-separated list of host addresses [default: host1.example.com:80,host2.example.com:80]
    #[arg(long, value_delimiter = ',')]
    pub hosts: Option<Vec<String>>,

    /// Fallback host when all hosts failed [default: localhost:80]
    #[arg(long)]
    pub fallback: Option<String>,

    /// Interval to check host latency [default: 10s]
    #[arg(long, value_parser = humantime::parse_duration)]
    pub check_interval: Option<Duration>,

    /// Timeout for a single latency probe [default: 2s]
    #[arg(long, value_parser = humantime::parse_duration)]
    pub dial_timeout: Option<Duration>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Build the effective, validated configuration.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(host) = self.listen_host {
            config.listener.host = host;
        }
        if let Some(hosts) = self.hosts {
            config.backends = hosts
                .into_iter()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect();
        }
        if let Some(fallback) = self.fallback {
            config.fallback = fallback;
        }
        if let Some(interval) = self.check_interval {
            config.health_check.interval = interval;
        }
        if let Some(timeout) = self.dial_timeout {
            config.health_check.dial_timeout = timeout;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}
