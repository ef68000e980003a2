//! Status Monitor Library
//!
//! Probes hosts on demand, tracks whether each one is up, and records every
//! change as an event trail.
//!
//! # Architecture Overview
//!
//! ```text
//!     GET /up?host=H ──▶ http ──▶ probe (DNS + TCP) ──▶ tracker::StateStore
//!                                                            │
//!     GET /certinfo ───▶ http ──▶ probe ──▶ TLS inspector    ├──▶ events (queue → sink)
//!                                                            │
//!     GET /status ─────▶ http ──▶ snapshot                   └──▶ push ──▶ /ws clients
//!
//!     tracker::EvictionSweeper ── periodic ──▶ StateStore::evict_stale
//! ```

// Core subsystems
pub mod config;
pub mod events;
pub mod http;
pub mod probe;
pub mod push;
pub mod tracker;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::MonitorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use tracker::{EvictionSweeper, ServiceState, StateStore, TransitionEvent};
