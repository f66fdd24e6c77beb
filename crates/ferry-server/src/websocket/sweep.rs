//! Background sweep loop.
//!
//! One repeating timer for the whole presence registry. A fault inside a
//! tick is caught and logged; the next tick fires on schedule regardless.
//! The loop exits only when the shutdown token is cancelled.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::lifecycle::ConnectionLifecycle;

/// Run the sweep loop until cancelled.
pub async fn run_sweep_loop(
    lifecycle: Arc<ConnectionLifecycle>,
    interval: Duration,
    threshold_secs: i64,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(interval);
    // The first tick fires immediately; skip it so a fresh server does not
    // sweep before anyone has had a chance to heartbeat.
    let _ = ticker.tick().await;

    info!(
        interval_secs = interval.as_secs(),
        threshold_secs, "sweep loop started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let tick = AssertUnwindSafe(lifecycle.on_sweep_tick(threshold_secs));
                match tick.catch_unwind().await {
                    Ok(evicted) => {
                        if evicted > 0 {
                            debug!(evicted, "sweep tick complete");
                        }
                    }
                    Err(_) => warn!("sweep tick panicked; continuing"),
                }
            }
            () = cancel.cancelled() => {
                info!("sweep loop stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use ferry_core::{ConnectionId, DeviceInfo, ManualClock};
    use ferry_events::EventLogs;
    use ferry_presence::{PresenceRegistry, SessionRegistry, OFFLINE_THRESHOLD_SECS};

    use crate::websocket::broadcast::BroadcastManager;

    fn lifecycle_with_clock() -> (Arc<ManualClock>, Arc<ConnectionLifecycle>) {
        let clock = ManualClock::start_now();
        let sessions = Arc::new(SessionRegistry::new(clock.clone()));
        let presence = Arc::new(PresenceRegistry::new(sessions, clock.clone()));
        let events = Arc::new(EventLogs::new(clock.clone()));
        let broadcast = Arc::new(BroadcastManager::new(clock.clone()));
        (
            clock,
            Arc::new(ConnectionLifecycle::new(presence, events, broadcast)),
        )
    }

    #[tokio::test]
    async fn loop_exits_on_cancel() {
        let (_clock, lifecycle) = lifecycle_with_clock();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_sweep_loop(
            lifecycle,
            Duration::from_secs(10),
            OFFLINE_THRESHOLD_SECS,
            cancel.clone(),
        ));
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_evict_stale_devices() {
        let (clock, lifecycle) = lifecycle_with_clock();
        let device = DeviceInfo::from_user_agent("curl/8", "10.0.0.2");
        let _ = lifecycle.on_connect(ConnectionId::new(), device).await;
        clock.advance(ChronoDuration::seconds(OFFLINE_THRESHOLD_SECS + 5));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_sweep_loop(
            lifecycle.clone(),
            Duration::from_secs(10),
            OFFLINE_THRESHOLD_SECS,
            cancel.clone(),
        ));

        // Advance paused time past the skipped first tick plus one interval.
        tokio::time::sleep(Duration::from_secs(21)).await;
        assert!(lifecycle.roster().as_array().unwrap().is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_devices_survive_ticks() {
        let (_clock, lifecycle) = lifecycle_with_clock();
        let device = DeviceInfo::from_user_agent("curl/8", "10.0.0.3");
        let _ = lifecycle.on_connect(ConnectionId::new(), device).await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_sweep_loop(
            lifecycle.clone(),
            Duration::from_secs(10),
            OFFLINE_THRESHOLD_SECS,
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(lifecycle.roster().as_array().unwrap().len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }
}
