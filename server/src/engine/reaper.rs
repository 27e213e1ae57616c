//! Background eviction of participants whose heartbeat has lapsed. Browser
//! close gives no signal, so liveness is inferred: a session that has not
//! pinged within the timeout is treated exactly like an explicit leave.

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::engine::coordinator::Coordinator;
use crate::engine::policy;
use crate::error::AppError;

/// Spawn the periodic sweep. The timeout should exceed the client ping
/// interval by a safety margin (3x) so transient network loss does not
/// false-evict live participants.
pub fn spawn(
    coordinator: Coordinator,
    interval: std::time::Duration,
    heartbeat_timeout: chrono::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sweep_once(&coordinator, heartbeat_timeout).await {
                Ok(0) => {}
                Ok(evicted) => info!(evicted, "reaper evicted stale participants"),
                Err(e) => warn!(error = %e, "reaper sweep failed"),
            }
        }
    })
}

/// One sweep over all open rooms. Rooms are processed one at a time with no
/// lock held across them, so a slow room never blocks liveness handling of
/// the others. Evictions run through the coordinator's leave path and so
/// share its empty-room teardown cascade.
pub async fn sweep_once(
    coordinator: &Coordinator,
    timeout: chrono::Duration,
) -> Result<usize, AppError> {
    let now = Utc::now();
    let mut evicted = 0;

    for room_id in coordinator.store().list_room_ids().await? {
        // The room may have closed since the listing; skip it.
        let Some(snapshot) = coordinator.store().read_room(&room_id).await? else {
            continue;
        };

        for session_id in policy::expired_sessions(&snapshot, now, timeout) {
            match coordinator.leave(&room_id, &session_id).await {
                Ok(result) => {
                    if result.success {
                        info!(room_id, session_id, "evicted expired participant");
                        evicted += 1;
                    }
                }
                // Room emptied while we were evicting; nothing left to do.
                Err(AppError::RoomNotFound) => break,
                Err(e) => {
                    warn!(room_id, session_id, error = %e, "failed to evict participant");
                }
            }
        }
    }

    Ok(evicted)
}
