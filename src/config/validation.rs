//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every backend and the fallback must be a usable `host:port`
//! - Durations and budgets must be non-zero
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::time::Duration;

use crate::config::schema::ProxyConfig;
use crate::load_balancer::endpoint::{AddressError, Endpoint};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,
    #[error("backend: {0}")]
    Backend(AddressError),
    #[error("fallback: {0}")]
    Fallback(AddressError),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check a configuration and collect every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    for addr in &config.backends {
        if let Err(e) = Endpoint::parse(addr) {
            errors.push(ValidationError::Backend(e));
        }
    }
    if let Err(e) = Endpoint::parse(&config.fallback) {
        errors.push(ValidationError::Fallback(e));
    }

    if config.listener.port == 0 {
        errors.push(ValidationError::Zero("listener.port"));
    }

    let durations = [
        ("health_check.interval", config.health_check.interval),
        ("health_check.dial_timeout", config.health_check.dial_timeout),
        ("timeouts.connect", config.timeouts.connect),
        ("timeouts.request", config.timeouts.request),
    ];
    for (name, value) in durations {
        if value == Duration::ZERO {
            errors.push(ValidationError::Zero(name));
        }
    }

    if config.health_check.tolerate_max == 0 {
        errors.push(ValidationError::Zero("health_check.tolerate_max"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
