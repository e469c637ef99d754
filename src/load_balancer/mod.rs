//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → selector.rs (read latest ranking snapshot)
//!     → fastest reachable endpoint.rs, or the fallback
//!     → http server rewrites the request to that address
//! ```
//!
//! # Design Decisions
//! - Selection is a pure read; it never dials or waits on the prober
//! - No weighting or connection counting: lowest connect latency wins

pub mod endpoint;
pub mod selector;

pub use endpoint::{Endpoint, Latency};
pub use selector::select_target;
