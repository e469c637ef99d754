//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single configured backend (or the fallback)
//! - Hold the last measured connect latency
//! - Order endpoints so that unreachable ones sort last

use axum::http::uri::Authority;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Last measured connect latency of an endpoint.
///
/// Every `Reachable` value orders before `Unreachable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Latency {
    /// Connection established in the given time.
    Reachable(Duration),
    /// Dial failed or timed out, or the endpoint was never probed.
    Unreachable,
}

impl Latency {
    /// Return true if the last probe connected.
    pub fn is_reachable(&self) -> bool {
        matches!(self, Latency::Reachable(_))
    }
}

impl PartialOrd for Latency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Latency {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Latency::Reachable(a), Latency::Reachable(b)) => a.cmp(b),
            (Latency::Reachable(_), Latency::Unreachable) => Ordering::Less,
            (Latency::Unreachable, Latency::Reachable(_)) => Ordering::Greater,
            (Latency::Unreachable, Latency::Unreachable) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Latency::Reachable(d) => write!(f, "{:?}", d),
            Latency::Unreachable => f.write_str("unreachable"),
        }
    }
}

/// Reason an address could not be turned into an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid address {0:?}: {1}")]
    Malformed(String, url::ParseError),
    #[error("invalid address {0:?}: missing host")]
    MissingHost(String),
    #[error("invalid address {0:?}: expected host:port without path or query")]
    NotHostPort(String),
    #[error("invalid address {0:?}: missing port")]
    MissingPort(String),
    #[error("invalid address {0:?}: port must be non-zero")]
    ZeroPort(String),
}

/// A single backend server, addressed as `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Routable base URL (`http://host:port`).
    pub url: Url,
    /// `host:port` used both to dial and as the upstream authority.
    pub address: String,
    /// Result of the most recent probe.
    pub latency: Latency,
}

impl Endpoint {
    /// Parse a `host:port` pair into an endpoint that has not been probed yet.
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let raw = address.trim();
        let url = Url::parse(&format!("http://{}", raw))
            .map_err(|e| AddressError::Malformed(raw.to_string(), e))?;

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(AddressError::MissingHost(raw.to_string())),
        };

        if url.path() != "/" || url.query().is_some() || url.fragment().is_some()
            || !url.username().is_empty()
        {
            return Err(AddressError::NotHostPort(raw.to_string()));
        }

        // `Url` drops an explicit default port, so read it from the raw text.
        let port = Authority::from_str(raw)
            .map_err(|_| AddressError::NotHostPort(raw.to_string()))?
            .port_u16()
            .ok_or_else(|| AddressError::MissingPort(raw.to_string()))?;
        if port == 0 {
            return Err(AddressError::ZeroPort(raw.to_string()));
        }

        Ok(Self {
            url,
            address: format!("{}:{}", host, port),
            latency: Latency::Unreachable,
        })
    }

    /// Copy of this endpoint carrying a new measurement.
    pub fn with_latency(&self, latency: Latency) -> Self {
        Self {
            url: self.url.clone(),
            address: self.address.clone(),
            latency,
        }
    }

    /// Return true if the last probe connected.
    pub fn is_reachable(&self) -> bool {
        self.latency.is_reachable()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str().trim_end_matches('/'))
    }
}
