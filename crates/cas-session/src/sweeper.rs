//! Background eviction of stale sessions.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::handle::SessionStoreHandle;

/// Shortest interval the sweeper runs at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns a task that evicts sessions older than `max_age` every `interval`.
///
/// Eviction goes through the same delete path as logout, so both indexes are
/// cleared together. Intervals below [`MIN_SWEEP_INTERVAL`] are raised to it.
/// The task runs until aborted.
pub fn spawn_session_sweeper(
    handle: SessionStoreHandle,
    interval: Duration,
    max_age: Duration,
) -> JoinHandle<()> {
    if interval < MIN_SWEEP_INTERVAL {
        tracing::warn!(
            "Session sweep interval {:?} too short, using {:?}",
            interval,
            MIN_SWEEP_INTERVAL
        );
    }
    let interval = interval.max(MIN_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = handle.evict_expired(max_age, Utc::now()).await {
                tracing::warn!("Session sweep failed: {}", e);
            }
        }
    })
}
