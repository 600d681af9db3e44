use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::StoreClient;
use crate::errors::StoreError;


/// Sweep period used when none (or zero) is configured.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Run one expiry pass, deleting every record with `expires_on < now`.
pub async fn sweep_expired(client: &dyn StoreClient) -> Result<usize, StoreError> {
    client.delete_expired(Utc::now()).await
}

/// Handle to a running sweeper task.
///
/// Dropping the handle without calling [`stop`](Self::stop) also ends the
/// task, but without waiting for it.
#[derive(Debug)]
pub struct SweeperHandle {
    quit: oneshot::Sender<()>,
    done: oneshot::Receiver<()>,
    interval: Duration,
}

impl SweeperHandle {
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Signal the task to quit and wait until it has released its timer.
    pub async fn stop(self) {
        let (quit, done) = self.into_parts();
        let _ = quit.send(());
        let _ = done.await;
        info!("session sweeper stopped");
    }

    /// The raw quit signal and completion acknowledgment.
    pub fn into_parts(self) -> (oneshot::Sender<()>, oneshot::Receiver<()>) {
        (self.quit, self.done)
    }
}

/// Spawn a task that sweeps expired records every `interval`.
///
/// A zero interval means [`DEFAULT_CLEANUP_INTERVAL`]. The first pass runs
/// one interval after start. Passes never overlap and a failed pass is
/// logged and retried on the next tick.
pub fn start(client: Arc<dyn StoreClient>, interval: Duration) -> SweeperHandle {
    let interval = if interval.is_zero() {
        DEFAULT_CLEANUP_INTERVAL
    } else {
        interval
    };
    let (quit_tx, mut quit_rx) = oneshot::channel::<()>();
    let (done_tx, done_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Fires on an explicit quit and when the handle is dropped.
                _ = &mut quit_rx => break,
                _ = ticker.tick() => {
                    match sweep_expired(client.as_ref()).await {
                        Ok(0) => debug!("session sweep found nothing to delete"),
                        Ok(deleted) => info!(deleted, "session sweep deleted expired records"),
                        Err(e) => warn!(error = %e, "session sweep failed, retrying next tick"),
                    }
                }
            }
        }

        drop(ticker);
        let _ = done_tx.send(());
    });

    info!(interval_secs = interval.as_secs(), "session sweeper started");
    SweeperHandle {
        quit: quit_tx,
        done: done_rx,
        interval,
    }
}
