//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, trace span, request metrics)
//!     → handlers.rs
//!         /up        → probe → StateStore::update → JSON timings
//!         /certinfo  → probe → cert inspector → JSON chain
//!         /status    → StateStore::snapshot
//!     → websocket.rs
//!         /ws        → snapshot, then pushed transitions
//!     → error.rs (JSON error bodies)
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;
pub mod websocket;

pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
