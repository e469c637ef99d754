//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Reset error budget (passive.rs)
//!     → prober.rs dials every endpoint
//!     → Publish ranking to state.rs
//!
//! Passive health checks (passive.rs):
//!     Forwarding failure reported
//!     → Spend tolerance
//!     → Fire an extra prober.rs cycle if the recheck budget allows
//!
//! Selection (load_balancer::selector):
//!     Read state.rs snapshot → fastest endpoint or fallback
//! ```
//!
//! # Design Decisions
//! - Health is a latency ranking, not a per-backend up/down flag
//! - Readers never wait on probing; only the publish swaps state
//! - The error budget is independent of the ranking lock

pub mod active;
pub mod passive;
pub mod prober;
pub mod state;

pub use active::HealthMonitor;
pub use passive::{ErrorMonitor, RecheckTrigger, SpawnRecheck};
pub use prober::{Dialer, LatencyProber, TcpDialer};
pub use state::{HealthState, Ranking};
