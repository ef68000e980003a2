//! Concurrency-safe host liveness table.
//!
//! # Responsibilities
//! - Apply liveness reports and detect up/down transitions
//! - Maintain the `down_since` downtime window
//! - Remove hosts whose last report is older than the inactivity timeout
//! - Hand transition records to the event trail and the push hub
//!
//! # Design Decisions
//! - One mutex guards the whole table; reports, snapshots and the eviction
//!   scan all go through it, so per-host updates are linearized
//! - The critical section does no I/O: records are queued with a
//!   non-blocking enqueue, diagnostics are logged after the lock is released
//! - Records are queued while the lock is held so the trail keeps the order
//!   in which transitions were applied

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};

use crate::events::{AppendError, EventLog};
use crate::observability::metrics;
use crate::push::{PushHub, StatusNotice};
use crate::tracker::state::{EventKind, ServiceState, TransitionEvent};

/// Outcome of applying a single liveness report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First report for this host.
    Added,
    /// Liveness unchanged; only `last_seen` moved.
    Unchanged,
    WentUp,
    WentDown,
}

impl Observation {
    fn event_kind(&self) -> Option<EventKind> {
        match self {
            Observation::Added => Some(EventKind::Added),
            Observation::Unchanged => None,
            Observation::WentUp => Some(EventKind::Up),
            Observation::WentDown => Some(EventKind::Down),
        }
    }
}

/// The host liveness table.
#[derive(Debug)]
pub struct StateStore {
    hosts: Mutex<HashMap<String, ServiceState>>,
    booted_at: DateTime<Utc>,
    events: EventLog,
    push: Option<PushHub>,
}

impl StateStore {
    /// Create an empty store; the boot time is taken as now.
    pub fn new(events: EventLog) -> Self {
        Self::with_boot_time(events, Utc::now())
    }

    pub fn with_boot_time(events: EventLog, booted_at: DateTime<Utc>) -> Self {
        Self {
            hosts: Mutex::new(HashMap::new()),
            booted_at,
            events,
            push: None,
        }
    }

    /// Publish every transition to `hub` as well.
    pub fn with_push(mut self, hub: PushHub) -> Self {
        self.push = Some(hub);
        self
    }

    /// Time the monitor started; the start of every `added` record.
    pub fn booted_at(&self) -> DateTime<Utc> {
        self.booted_at
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, ServiceState>> {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a liveness report for `host` observed now.
    pub fn update(&self, host: &str, is_up: bool) -> Observation {
        self.update_at(host, is_up, Utc::now())
    }

    /// Record a liveness report for `host` observed at `now`.
    pub fn update_at(&self, host: &str, is_up: bool, now: DateTime<Utc>) -> Observation {
        let (observation, queued, tracked) = {
            let mut hosts = self.table();

            let (observation, event) = match hosts.get_mut(host) {
                None => {
                    hosts.insert(host.to_string(), ServiceState::first_seen(host, is_up, now));
                    (
                        Observation::Added,
                        Some(TransitionEvent::added(host, is_up, self.booted_at, now)),
                    )
                }
                Some(state) => {
                    // Reports are timestamped before the lock is taken; a late
                    // arrival is applied at the latest time already seen.
                    let now = state.last_seen.max(now);
                    state.last_seen = now;

                    if state.is_up == is_up {
                        (Observation::Unchanged, None)
                    } else if is_up {
                        let start = state.down_since.take().unwrap_or(now);
                        state.is_up = true;
                        state.last_change = now;
                        (Observation::WentUp, Some(TransitionEvent::went_up(host, start, now)))
                    } else {
                        state.down_since = Some(now);
                        state.is_up = false;
                        state.last_change = now;
                        (Observation::WentDown, Some(TransitionEvent::went_down(host, now)))
                    }
                }
            };

            let queued = event.map(|event| self.emit(event, Some(is_up)));
            (observation, queued, hosts.len())
        };

        match observation {
            Observation::Added => {
                tracing::info!(host = %host, is_up, "Added host to the list of monitored hosts");
            }
            Observation::WentUp => tracing::info!(host = %host, "Host is up"),
            Observation::WentDown => tracing::warn!(host = %host, "Host is down"),
            Observation::Unchanged => tracing::trace!(host = %host, is_up, "Host liveness unchanged"),
        }
        if let Some(kind) = observation.event_kind() {
            metrics::record_transition(kind);
        }
        metrics::set_tracked_hosts(tracked);
        if let Some(Err(e)) = queued {
            tracing::warn!(host = %host, error = %e, "Transition not recorded in event trail");
        }

        observation
    }

    /// Remove every host not reported for longer than `timeout`.
    pub fn evict_stale(&self, timeout: TimeDelta) -> Vec<ServiceState> {
        self.evict_stale_at(Utc::now(), timeout)
    }

    /// Remove every host whose `now - last_seen` exceeds `timeout`.
    ///
    /// Returns the removed states. The scan and the removal happen under the
    /// same lock as [`update_at`](Self::update_at).
    pub fn evict_stale_at(&self, now: DateTime<Utc>, timeout: TimeDelta) -> Vec<ServiceState> {
        let (evicted, failures, tracked) = {
            let mut hosts = self.table();

            let mut evicted = Vec::new();
            hosts.retain(|_, state| {
                let stale = now.signed_duration_since(state.last_seen) > timeout;
                if stale {
                    evicted.push(state.clone());
                }
                !stale
            });

            let failures: Vec<(String, AppendError)> = evicted
                .iter()
                .filter_map(|state| {
                    let event = TransitionEvent::evicted(&state.host, state.last_seen, now);
                    self.emit(event, None).err().map(|e| (state.host.clone(), e))
                })
                .collect();

            (evicted, failures, hosts.len())
        };

        for state in &evicted {
            tracing::info!(
                host = %state.host,
                last_seen = %state.last_seen.to_rfc3339(),
                "Removed host from the list of monitored hosts after inactivity"
            );
            metrics::record_transition(EventKind::Evicted);
        }
        for (host, e) in failures {
            tracing::warn!(host = %host, error = %e, "Eviction not recorded in event trail");
        }
        metrics::set_tracked_hosts(tracked);

        evicted
    }

    /// Queue a record and notify push clients. Called with the lock held.
    fn emit(&self, event: TransitionEvent, is_up: Option<bool>) -> Result<(), AppendError> {
        if let Some(push) = &self.push {
            if let Some(notice) = StatusNotice::from_event(&event, is_up) {
                push.publish(notice);
            }
        }
        self.events.append(event)
    }

    /// Point-in-time copy of every tracked host, sorted by host.
    pub fn snapshot(&self) -> Vec<ServiceState> {
        let mut states: Vec<ServiceState> = self.table().values().cloned().collect();
        states.sort_by(|a, b| a.host.cmp(&b.host));
        states
    }

    pub fn get(&self, host: &str) -> Option<ServiceState> {
        self.table().get(host).cloned()
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
}
