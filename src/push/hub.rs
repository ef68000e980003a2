//! Broadcast hub for push clients.
//!
//! The hub owns the only sender of a broadcast channel. Connected clients
//! hold receivers; the set of clients is never touched by request handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::tracker::{EventKind, ServiceState, TransitionEvent};

/// Message pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusNotice {
    /// Full table, sent once when a client connects.
    Snapshot {
        #[serde(rename = "bootedAt")]
        booted_at: DateTime<Utc>,
        hosts: Vec<ServiceState>,
    },
    /// A host was added, changed liveness, or was evicted.
    Transition {
        host: String,
        kind: EventKind,
        /// Liveness after the transition; absent for evictions.
        #[serde(rename = "isUp", skip_serializing_if = "Option::is_none")]
        is_up: Option<bool>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl StatusNotice {
    pub(crate) fn from_event(event: &TransitionEvent, is_up: Option<bool>) -> Option<Self> {
        let host = event.host.clone()?;
        Some(StatusNotice::Transition {
            host,
            kind: event.kind,
            is_up,
            start: event.start,
            end: event.end,
        })
    }
}

/// Fan-out point for [`StatusNotice`]s.
#[derive(Debug, Clone)]
pub struct PushHub {
    tx: broadcast::Sender<StatusNotice>,
}

impl PushHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Register a new client.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusNotice> {
        self.tx.subscribe()
    }

    /// Send a notice to every connected client. Never blocks.
    ///
    /// Returns the number of clients that received it.
    pub fn publish(&self, notice: StatusNotice) -> usize {
        self.tx.send(notice).unwrap_or(0)
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for PushHub {
    fn default() -> Self {
        Self::new(256)
    }
}
