//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Endpoints → Health state → First probe → Monitor → Listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop health monitor → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then health, then listeners
//! - Ordered shutdown: stop probing and accepting, drain, close

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Proxy, StartupError};
