//! Push notification subsystem.
//!
//! # Data Flow
//! ```text
//! StateStore (inside its lock, non-blocking)
//!     → hub.rs (PushHub::publish → broadcast channel)
//!     → http/websocket.rs (one receiver per connected client)
//! ```
//!
//! # Design Decisions
//! - Single sender owns the registry; clients only hold receivers
//! - Slow clients lag and skip ahead instead of applying backpressure

pub mod hub;

pub use hub::{PushHub, StatusNotice};
