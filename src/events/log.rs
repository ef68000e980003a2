//! Bounded, non-blocking event trail queue.
//!
//! # Responsibilities
//! - Accept records from the state store and the sweeper without blocking
//! - Drop (and count) records when the queue is full
//! - Drain records into an [`EventSink`] on a dedicated writer task

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::events::sink::EventSink;
use crate::observability::metrics;
use crate::tracker::TransitionEvent;

/// Reason a record could not be queued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppendError {
    #[error("event trail queue is full, record dropped")]
    Full,
    #[error("event trail writer has stopped, record dropped")]
    Closed,
}

/// Cloneable handle used to append records to the event trail.
#[derive(Debug, Clone)]
pub struct EventLog {
    tx: mpsc::Sender<TransitionEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventLog {
    /// Create a handle and the receiving end of its queue.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TransitionEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// Create a handle together with a writer draining into `sink`.
    pub fn with_writer(capacity: usize, sink: Box<dyn EventSink>) -> (Self, EventWriter) {
        let (log, rx) = Self::channel(capacity);
        (log, EventWriter::new(rx, sink))
    }

    /// Queue a record. Never blocks and never waits for the sink.
    ///
    /// Safe to call while holding a lock; the caller decides whether and
    /// where to report the error.
    pub fn append(&self, event: TransitionEvent) -> Result<(), AppendError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::record_event_dropped();
                Err(AppendError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::record_event_dropped();
                Err(AppendError::Closed)
            }
        }
    }

    /// Queue a record, reporting a failure on the diagnostic channel.
    pub fn record(&self, event: TransitionEvent) {
        let reason = event.reason.clone();
        if let Err(e) = self.append(event) {
            tracing::warn!(error = %e, reason = %reason, "Failed to record event");
        }
    }

    /// Number of records dropped since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Task body that drains the queue into a sink.
pub struct EventWriter {
    rx: mpsc::Receiver<TransitionEvent>,
    sink: Box<dyn EventSink>,
}

impl EventWriter {
    pub fn new(rx: mpsc::Receiver<TransitionEvent>, sink: Box<dyn EventSink>) -> Self {
        Self { rx, sink }
    }

    /// Write records until every [`EventLog`] handle has been dropped.
    ///
    /// Sink failures are logged and the record is discarded; the writer
    /// keeps going with the next record.
    pub async fn run(mut self) {
        tracing::debug!(sink = self.sink.name(), "Event writer starting");

        let mut written: u64 = 0;
        while let Some(event) = self.rx.recv().await {
            match self.sink.write(&event).await {
                Ok(()) => written += 1,
                Err(e) => {
                    metrics::record_event_sink_error();
                    tracing::warn!(
                        sink = self.sink.name(),
                        error = %e,
                        reason = %event.reason,
                        "Failed to write event record"
                    );
                }
            }
        }

        if let Err(e) = self.sink.flush().await {
            tracing::warn!(sink = self.sink.name(), error = %e, "Failed to flush event sink");
        }
        tracing::debug!(written, "Event writer stopped");
    }
}
