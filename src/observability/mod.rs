//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! tracker, probe, events, http
//!     → logging.rs (tracing subscriber: pretty or JSON, EnvFilter)
//!     → metrics.rs (transition counters, table gauge, probe histograms)
//!
//! Exposed as:
//!     → stdout
//!     → Prometheus scrape endpoint, when enabled
//! ```
//!
//! # Design Decisions
//! - Diagnostics only; the event trail lives in `events`
//! - Recording never happens under the table lock
//! - Request spans carry the `x-request-id` set by the HTTP layer

pub mod logging;
pub mod metrics;
