//! Concurrent access to the liveness table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use status_monitor::events::EventLog;
use status_monitor::tracker::{EventKind, EvictionSweeper, StateStore, TransitionEvent};

const TASKS: usize = 16;
const UPDATES_PER_TASK: usize = 200;
const HOSTS: usize = 4;

fn drain(rx: &mut tokio::sync::mpsc::Receiver<TransitionEvent>) -> Vec<TransitionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Per host, the trail must read: added, then alternating up/down, with an
/// eviction allowed anywhere and always followed by a fresh `added`.
fn check_trail(events: &[TransitionEvent]) -> HashMap<String, Option<bool>> {
    let mut last: HashMap<String, Option<bool>> = HashMap::new();
    for event in events {
        let host = event.host.clone().expect("host events only");
        let current = last.get(&host).copied().flatten();
        match event.kind {
            EventKind::Added => {
                assert!(current.is_none(), "{} added twice", host);
                let up = event.reason.ends_with("(up)");
                last.insert(host, Some(up));
            }
            EventKind::Up => {
                assert_eq!(current, Some(false), "{} went up while not down", host);
                last.insert(host, Some(true));
            }
            EventKind::Down => {
                assert_eq!(current, Some(true), "{} went down while not up", host);
                last.insert(host, Some(false));
            }
            EventKind::Evicted => {
                assert!(current.is_some(), "{} evicted while untracked", host);
                last.insert(host, None);
            }
            EventKind::Lifecycle => panic!("unexpected lifecycle record"),
        }
        assert!(event.start <= event.end);
    }
    last
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_keep_table_and_trail_consistent() {
    let (events, mut rx) = EventLog::channel(TASKS * UPDATES_PER_TASK + 16);
    let store = Arc::new(StateStore::new(events));

    let mut handles = Vec::new();
    for task in 0..TASKS {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut rng = fastrand::Rng::with_seed(task as u64);
            for _ in 0..UPDATES_PER_TASK {
                let host = format!("host-{}.test", rng.usize(..HOSTS));
                store.update(&host, rng.bool());
                if rng.u8(..4) == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }

    let reader = {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                for state in store.snapshot() {
                    assert!(state.is_consistent(), "{:?}", state);
                }
                tokio::task::yield_now().await;
            }
        })
    };

    for handle in handles {
        handle.await.unwrap();
    }
    reader.await.unwrap();

    assert_eq!(store.len(), HOSTS);
    let trail = drain(&mut rx);
    let last = check_trail(&trail);

    for state in store.snapshot() {
        assert!(state.is_consistent());
        assert_eq!(last[&state.host], Some(state.is_up), "{}", state.host);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn updates_racing_the_sweeper_never_lose_a_transition() {
    let (events, mut rx) = EventLog::channel(100_000);
    let store = Arc::new(StateStore::new(events));
    let sweeper = EvictionSweeper::new(store.clone(), Duration::from_millis(1), Duration::from_millis(2));
    let (stop_tx, stop_rx) = tokio::sync::broadcast::channel(1);
    let sweeper_task = tokio::spawn(sweeper.run(stop_rx));

    let mut handles = Vec::new();
    for task in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut rng = fastrand::Rng::with_seed(100 + task as u64);
            for _ in 0..300 {
                let host = format!("host-{}.test", rng.usize(..HOSTS));
                store.update(&host, rng.bool());
                if rng.u8(..3) == 0 {
                    tokio::time::sleep(Duration::from_millis(rng.u64(..4))).await;
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    stop_tx.send(()).unwrap();
    sweeper_task.await.unwrap();

    let trail = drain(&mut rx);
    let last = check_trail(&trail);

    for state in store.snapshot() {
        assert_eq!(last[&state.host], Some(state.is_up), "{}", state.host);
    }
    for (host, tracked) in last {
        assert_eq!(tracked.is_some(), store.get(&host).is_some(), "{}", host);
    }
}
