//! Per-host liveness state and the event trail record types.
//!
//! # State Invariant
//! ```text
//! is_up == true   ⇔  down_since == None
//! is_up == false  ⇔  down_since == Some(t), t = time of the up→down flip
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Liveness state of a single monitored host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceState {
    /// Host identifier as reported by the caller (unique key).
    pub host: String,
    /// Current liveness.
    pub is_up: bool,
    /// Time of the most recent up/down transition (or creation).
    pub last_change: DateTime<Utc>,
    /// Start of the current downtime window. Set only while the host is down.
    pub down_since: Option<DateTime<Utc>>,
    /// Time of the most recent report, whether or not the state changed.
    pub last_seen: DateTime<Utc>,
}

impl ServiceState {
    /// State for a host observed for the first time at `now`.
    pub(crate) fn first_seen(host: &str, is_up: bool, now: DateTime<Utc>) -> Self {
        Self {
            host: host.to_string(),
            is_up,
            last_change: now,
            down_since: if is_up { None } else { Some(now) },
            last_seen: now,
        }
    }

    /// Whether the `down_since` invariant holds.
    pub fn is_consistent(&self) -> bool {
        self.is_up == self.down_since.is_none()
    }
}

/// Category of an event trail record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Added,
    Up,
    Down,
    Evicted,
    /// Process lifecycle record (startup, shutdown).
    Lifecycle,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Added => "added",
            EventKind::Up => "up",
            EventKind::Down => "down",
            EventKind::Evicted => "evicted",
            EventKind::Lifecycle => "lifecycle",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single record of the event trail.
///
/// `start` and `end` bound the interval the record describes: for an `up`
/// record following a downtime window, `start` is when the host went down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub reason: String,
}

impl TransitionEvent {
    pub fn added(host: &str, is_up: bool, booted_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            start: booted_at,
            end: now,
            kind: EventKind::Added,
            host: Some(host.to_string()),
            reason: format!(
                "Added host '{}' to the list of monitored hosts ({})",
                host,
                if is_up { "up" } else { "down" }
            ),
        }
    }

    pub fn went_up(host: &str, start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            start,
            end: now,
            kind: EventKind::Up,
            host: Some(host.to_string()),
            reason: format!("Host '{}' is up", host),
        }
    }

    pub fn went_down(host: &str, now: DateTime<Utc>) -> Self {
        Self {
            start: now,
            end: now,
            kind: EventKind::Down,
            host: Some(host.to_string()),
            reason: format!("Host '{}' is down", host),
        }
    }

    pub fn evicted(host: &str, last_seen: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            start: last_seen,
            end: now,
            kind: EventKind::Evicted,
            host: Some(host.to_string()),
            reason: format!(
                "Removed host '{}' from the list of monitored hosts after {}s of inactivity",
                host,
                (now - last_seen).num_seconds()
            ),
        }
    }

    /// Instantaneous process lifecycle record.
    pub fn lifecycle(reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            start: now,
            end: now,
            kind: EventKind::Lifecycle,
            host: None,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_sets_down_since_only_when_down() {
        let now = Utc::now();
        let up = ServiceState::first_seen("a", true, now);
        assert_eq!(up.down_since, None);
        assert!(up.is_consistent());

        let down = ServiceState::first_seen("b", false, now);
        assert_eq!(down.down_since, Some(now));
        assert!(down.is_consistent());
    }

    #[test]
    fn event_serializes_as_json_line() {
        let now = Utc::now();
        let event = TransitionEvent::went_down("example.com", now);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "down");
        assert_eq!(json["host"], "example.com");
        assert_eq!(json["reason"], "Host 'example.com' is down");

        let lifecycle = serde_json::to_value(TransitionEvent::lifecycle("Server exiting")).unwrap();
        assert!(lifecycle.get("host").is_none());
    }
}
