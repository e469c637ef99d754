//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span)
//!     → [selector picks fastest endpoint or fallback]
//!     → request.rs (rewrite authority, strip hop-by-hop headers)
//!     → upstream client
//!     → response.rs (relay, or 502/504 on failure)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::ForwardError;
pub use server::HttpServer;
