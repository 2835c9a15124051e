//! Viewer presence
//!
//! While a viewer watches a stream it upserts a presence row right away
//! and then on every heartbeat. The service derives the stream's viewer
//! count from presence recency; the tracker reads that count back after
//! each heartbeat but only logs it. Leaving deletes the row.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::backend::RealtimeBackend;
use crate::config::MIN_INTERVAL;
use crate::error::Result;
use crate::model::{StreamId, UserId};

/// Refresh one presence row and read back the stream's viewer count
pub async fn heartbeat(
    backend: &dyn RealtimeBackend,
    stream_id: StreamId,
    viewer_id: UserId,
) -> Result<u32> {
    backend.upsert_presence(stream_id, viewer_id).await?;
    let viewers = backend.viewer_count(stream_id).await?;
    Ok(viewers)
}

/// Heartbeat task for one viewer on one stream
pub struct PresenceTracker {
    backend: Arc<dyn RealtimeBackend>,
    stream_id: StreamId,
    viewer_id: UserId,
    heartbeats: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl PresenceTracker {
    /// Join the stream and keep the row fresh every `interval`
    pub fn spawn(
        backend: Arc<dyn RealtimeBackend>,
        stream_id: StreamId,
        viewer_id: UserId,
        interval: Duration,
    ) -> Self {
        let heartbeats = Arc::new(AtomicU64::new(0));

        let task = {
            let backend = Arc::clone(&backend);
            let heartbeats = Arc::clone(&heartbeats);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    // First tick completes immediately: that is the join
                    ticker.tick().await;

                    match heartbeat(backend.as_ref(), stream_id, viewer_id).await {
                        Ok(viewers) => {
                            heartbeats.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(
                                stream = %stream_id,
                                viewer = %viewer_id,
                                viewers = viewers,
                                "Presence heartbeat"
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                stream = %stream_id,
                                viewer = %viewer_id,
                                error = %e,
                                "Presence heartbeat failed"
                            );
                        }
                    }
                }
            })
        };

        Self {
            backend,
            stream_id,
            viewer_id,
            heartbeats,
            task: Some(task),
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Successful heartbeats so far (the join counts as the first)
    pub fn heartbeats(&self) -> u64 {
        self.heartbeats.load(Ordering::Relaxed)
    }

    /// Stop heartbeating and delete the presence row
    pub async fn leave(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        match self.backend.delete_presence(self.stream_id, self.viewer_id).await {
            Ok(()) => tracing::debug!(stream = %self.stream_id, viewer = %self.viewer_id, "Left stream"),
            Err(e) => tracing::debug!(
                stream = %self.stream_id,
                error = %e,
                "Presence delete failed, row will expire"
            ),
        }
    }
}

impl Drop for PresenceTracker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
