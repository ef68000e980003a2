//! Periodic eviction of hosts that stopped being reported.
//!
//! # Responsibilities
//! - Tick on a single configured interval
//! - Ask the store to drop hosts idle longer than the inactivity timeout
//!
//! # Design Decisions
//! - One sweeper per store, one timeout (no secondary hardcoded sweep)
//! - Missed ticks are delayed, not bursted
//! - Exits only on shutdown

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::TrackerConfig;
use crate::tracker::store::StateStore;

pub struct EvictionSweeper {
    store: Arc<StateStore>,
    interval: Duration,
    timeout: TimeDelta,
}

impl EvictionSweeper {
    pub fn new(store: Arc<StateStore>, interval: Duration, inactivity_timeout: Duration) -> Self {
        Self {
            store,
            interval,
            timeout: TimeDelta::from_std(inactivity_timeout).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn from_config(store: Arc<StateStore>, config: &TrackerConfig) -> Self {
        Self::new(
            store,
            Duration::from_millis(config.sweep_interval_ms),
            Duration::from_secs(config.inactivity_timeout_secs),
        )
    }

    /// Run one sweep now. Returns the number of evicted hosts.
    pub fn sweep(&self) -> usize {
        self.store.evict_stale(self.timeout).len()
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            inactivity_timeout_secs = self.timeout.num_seconds(),
            "Eviction sweeper starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.sweep();
                    if evicted > 0 {
                        tracing::debug!(evicted, remaining = self.store.len(), "Sweep complete");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Eviction sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
