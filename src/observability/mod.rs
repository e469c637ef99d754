//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! prober, error monitor, proxy handler
//!     → tracing events with structured fields
//!     → logging.rs subscriber (stdout)
//! ```

pub mod logging;
