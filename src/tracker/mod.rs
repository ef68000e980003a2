//! Host liveness tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Liveness report (transport, after a probe):
//!     → store.rs (StateStore::update)
//!     → state.rs (ServiceState transition)
//!     → events (EventLog::append) + push (PushHub::publish)
//!
//! Periodic timer (sweeper.rs):
//!     → StateStore::evict_stale
//!     → "evicted" records
//! ```
//!
//! # Design Decisions
//! - The store is an explicit instance shared via `Arc`, never a global
//! - Reports never fail; probe errors arrive already folded into `false`
//! - Eviction is housekeeping, independent of liveness

pub mod state;
pub mod store;
pub mod sweeper;

pub use state::{EventKind, ServiceState, TransitionEvent};
pub use store::{Observation, StateStore};
pub use sweeper::EvictionSweeper;
