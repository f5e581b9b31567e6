//! Background cache eviction.

use crate::coordinator::Coordinator;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Spawn the periodic eviction task. The first sweep runs one `interval`
/// after startup.
///
/// Sweeps run inline on this task, so two sweeps never overlap.
pub fn spawn_cache_eviction(coordinator: Arc<Coordinator>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            interval_secs = interval.as_secs_f64(),
            "Cache eviction task started"
        );
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_sweep(&coordinator).await;
        }
    })
}

/// Run one sweep with the current time as cutoff. Failures are logged and
/// retried on the next tick.
pub async fn run_sweep(coordinator: &Coordinator) -> usize {
    match coordinator.sweep_cache(OffsetDateTime::now_utc()).await {
        Ok(0) => {
            tracing::debug!("Cache sweep found no expired entries");
            0
        }
        Ok(removed) => {
            tracing::info!(removed, "Evicted expired cache entries");
            removed
        }
        Err(e) => {
            tracing::error!(error = %e, "Cache sweep failed");
            0
        }
    }
}
