//! Event trail subsystem.
//!
//! # Data Flow
//! ```text
//! StateStore / EvictionSweeper / lifecycle
//!     → log.rs (EventLog::append, non-blocking try_send)
//!     → bounded queue (drop-new on overflow, counted)
//!     → log.rs (EventWriter task)
//!     → sink.rs (file, tracing, memory)
//! ```
//!
//! # Design Decisions
//! - Appending never blocks the caller and never fails it
//! - The trail is write-only; nothing in the process reads it back
//! - Sink failures are logged and the record is discarded, not retried

pub mod log;
pub mod sink;

pub use log::{AppendError, EventLog, EventWriter};
pub use sink::{EventSink, FileSink, MemorySink, TracingSink};
