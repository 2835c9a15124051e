//! In-memory realtime service
//!
//! Implements the full service contract in process, including the
//! server-side pieces the clients rely on but never run themselves: viewer
//! counts recomputed from presence recency, and a periodic sweep that
//! purges stale presence rows.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};

use crate::config::MIN_INTERVAL;
use crate::model::{
    Frame, NewFrame, PresenceRecord, Stream, StreamChange, StreamId, StreamStart, UserId,
};

use super::config::BackendConfig;
use super::entry::StreamEntry;
use super::error::BackendError;
use super::RealtimeBackend;

/// Process-local realtime service
///
/// Thread-safe via `RwLock`. Frame inserts and presence upserts take the
/// outer map lock for reading only, so streams do not contend with each other.
pub struct MemoryBackend {
    /// Map of stream id to stream entry
    streams: RwLock<HashMap<StreamId, Arc<RwLock<StreamEntry>>>>,

    /// Directory change fan-out
    changes: broadcast::Sender<StreamChange>,

    /// Configuration
    config: BackendConfig,
}

impl MemoryBackend {
    /// Create a new service with default configuration
    pub fn new() -> Self {
        Self::with_config(BackendConfig::default())
    }

    /// Create a new service with custom configuration
    pub fn with_config(config: BackendConfig) -> Self {
        let (changes, _) = broadcast::channel(config.broadcast_capacity);

        Self {
            streams: RwLock::new(HashMap::new()),
            changes,
            config,
        }
    }

    /// Get the service configuration
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Get total number of stream rows (active or not)
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }

    /// Get a snapshot of a directory row
    pub async fn stream(&self, stream_id: StreamId) -> Option<Stream> {
        let entry_arc = self.entry(stream_id).await.ok()?;
        let entry = entry_arc.read().await;
        Some(entry.stream.clone())
    }

    /// Get a viewer's presence row
    pub async fn presence(&self, stream_id: StreamId, viewer_id: UserId) -> Option<PresenceRecord> {
        let entry_arc = self.entry(stream_id).await.ok()?;
        let entry = entry_arc.read().await;
        entry.presence(&viewer_id).cloned()
    }

    /// Number of retained frames for a stream
    pub async fn frame_count(&self, stream_id: StreamId) -> usize {
        match self.entry(stream_id).await {
            Ok(entry_arc) => entry_arc.read().await.frame_count(),
            Err(_) => 0,
        }
    }

    async fn entry(&self, stream_id: StreamId) -> Result<Arc<RwLock<StreamEntry>>, BackendError> {
        let streams = self.streams.read().await;
        streams
            .get(&stream_id)
            .cloned()
            .ok_or(BackendError::StreamNotFound(stream_id))
    }

    fn notify(&self, change: StreamChange) {
        // No listeners is fine
        let _ = self.changes.send(change);
    }

    /// Run the presence sweep once
    ///
    /// Purges presence rows older than `presence_expiry` and publishes an
    /// update for every stream whose viewer count changed.
    pub async fn sweep_presence(&self) {
        let streams = self.streams.read().await;
        let now = Utc::now();
        let expiry = self.config.presence_expiry;

        for (id, entry_arc) in streams.iter() {
            let mut entry = entry_arc.write().await;
            let purged = entry.purge_stale(now, expiry);

            if entry.recount(now, expiry) {
                tracing::debug!(
                    stream = %id,
                    purged = purged,
                    viewers = entry.stream.viewer_count,
                    "Viewer count changed by sweep"
                );
                self.notify(StreamChange::Updated(entry.stream.clone()));
            }
        }
    }

    /// Spawn background presence sweep
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_presence_sweep(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let backend = Arc::clone(self);
        let interval = backend.config.sweep_interval.max(MIN_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                backend.sweep_presence().await;
            }
        })
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeBackend for MemoryBackend {
    async fn insert_frame(&self, frame: NewFrame) -> Result<Frame, BackendError> {
        let entry_arc = self.entry(frame.stream_id).await?;
        let mut entry = entry_arc.write().await;

        if !entry.stream.is_active {
            return Err(BackendError::StreamNotActive(frame.stream_id));
        }

        let frame = Frame::from_new(frame);
        let receivers = entry.append(frame.clone(), self.config.frame_retention);

        tracing::trace!(
            stream = %frame.stream_id,
            sequence = frame.sequence,
            bytes = frame.size(),
            receivers = receivers,
            "Frame appended"
        );

        Ok(frame)
    }

    async fn latest_frame(&self, stream_id: StreamId) -> Result<Option<Frame>, BackendError> {
        let entry_arc = self.entry(stream_id).await?;
        let entry = entry_arc.read().await;
        Ok(entry.latest().cloned())
    }

    async fn subscribe_frames(
        &self,
        stream_id: StreamId,
    ) -> Result<broadcast::Receiver<Frame>, BackendError> {
        let entry_arc = self.entry(stream_id).await?;
        let entry = entry_arc.read().await;
        let rx = entry.subscribe();

        tracing::debug!(
            stream = %stream_id,
            subscribers = entry.subscriber_count(),
            "Frame subscriber added"
        );

        Ok(rx)
    }

    async fn insert_stream(
        &self,
        admin_id: UserId,
        start: &StreamStart,
    ) -> Result<Stream, BackendError> {
        let stream = Stream::from_start(admin_id, start);
        let entry = StreamEntry::new(stream.clone(), &self.config);

        self.streams
            .write()
            .await
            .insert(stream.id, Arc::new(RwLock::new(entry)));

        tracing::info!(
            stream = %stream.id,
            name = %stream.stream_name,
            admin = %admin_id,
            "Stream row inserted"
        );

        self.notify(StreamChange::Inserted(stream.clone()));
        Ok(stream)
    }

    async fn update_stream_active(
        &self,
        stream_id: StreamId,
        active: bool,
    ) -> Result<Stream, BackendError> {
        let entry_arc = self.entry(stream_id).await?;
        let mut entry = entry_arc.write().await;

        entry.stream.is_active = active;
        entry.stream.updated_at = Utc::now();
        let stream = entry.stream.clone();
        drop(entry);

        tracing::info!(stream = %stream_id, active = active, "Stream row updated");

        self.notify(StreamChange::Updated(stream.clone()));
        Ok(stream)
    }

    async fn delete_stream(&self, stream_id: StreamId) -> Result<(), BackendError> {
        // Dropping the entry drops its sender, which closes every frame subscription
        let removed = self.streams.write().await.remove(&stream_id);
        if removed.is_none() {
            return Err(BackendError::StreamNotFound(stream_id));
        }

        tracing::info!(stream = %stream_id, "Stream row deleted");

        self.notify(StreamChange::Deleted(stream_id));
        Ok(())
    }

    async fn active_streams(&self) -> Result<Vec<Stream>, BackendError> {
        let streams = self.streams.read().await;
        let mut active = Vec::new();

        for entry_arc in streams.values() {
            let entry = entry_arc.read().await;
            if entry.stream.is_active {
                active.push(entry.stream.clone());
            }
        }

        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }

    async fn subscribe_streams(&self) -> Result<broadcast::Receiver<StreamChange>, BackendError> {
        Ok(self.changes.subscribe())
    }

    async fn upsert_presence(
        &self,
        stream_id: StreamId,
        viewer_id: UserId,
    ) -> Result<PresenceRecord, BackendError> {
        let entry_arc = self.entry(stream_id).await?;
        let mut entry = entry_arc.write().await;

        let record = entry.touch_viewer(viewer_id);
        if entry.recount(record.last_seen, self.config.presence_expiry) {
            self.notify(StreamChange::Updated(entry.stream.clone()));
        }

        Ok(record)
    }

    async fn delete_presence(
        &self,
        stream_id: StreamId,
        viewer_id: UserId,
    ) -> Result<(), BackendError> {
        let entry_arc = self.entry(stream_id).await?;
        let mut entry = entry_arc.write().await;

        if entry.remove_viewer(&viewer_id) && entry.recount(Utc::now(), self.config.presence_expiry)
        {
            self.notify(StreamChange::Updated(entry.stream.clone()));
        }

        Ok(())
    }

    async fn viewer_count(&self, stream_id: StreamId) -> Result<u32, BackendError> {
        let entry_arc = self.entry(stream_id).await?;
        let entry = entry_arc.read().await;
        Ok(entry.fresh_viewer_count(Utc::now(), self.config.presence_expiry))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;

    fn jpeg_stub() -> Bytes {
        Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9])
    }

    #[tokio::test]
    async fn test_insert_and_latest_frame() {
        let backend = MemoryBackend::new();
        let stream = backend
            .insert_stream(UserId::new(), &StreamStart::new("Test Feed", "Kakinada"))
            .await
            .unwrap();

        assert!(backend.latest_frame(stream.id).await.unwrap().is_none());

        backend
            .insert_frame(NewFrame::new(stream.id, 1, jpeg_stub()))
            .await
            .unwrap();
        backend
            .insert_frame(NewFrame::new(stream.id, 2, jpeg_stub()))
            .await
            .unwrap();

        let latest = backend.latest_frame(stream.id).await.unwrap().unwrap();
        assert_eq!(latest.sequence, 2);
    }

    #[tokio::test]
    async fn test_subscription_is_filtered_by_stream() {
        let backend = MemoryBackend::new();
        let a = backend
            .insert_stream(UserId::new(), &StreamStart::new("A", "here"))
            .await
            .unwrap();
        let b = backend
            .insert_stream(UserId::new(), &StreamStart::new("B", "there"))
            .await
            .unwrap();

        let mut rx = backend.subscribe_frames(a.id).await.unwrap();

        backend
            .insert_frame(NewFrame::new(b.id, 1, jpeg_stub()))
            .await
            .unwrap();
        backend
            .insert_frame(NewFrame::new(a.id, 7, jpeg_stub()))
            .await
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.stream_id, a.id);
        assert_eq!(received.sequence, 7);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_insert_frame_rejects_unknown_and_inactive() {
        let backend = MemoryBackend::new();
        let unknown = StreamId::new();

        let result = backend
            .insert_frame(NewFrame::new(unknown, 1, jpeg_stub()))
            .await;
        assert!(matches!(result, Err(BackendError::StreamNotFound(_))));

        let stream = backend
            .insert_stream(UserId::new(), &StreamStart::new("Test Feed", "Kakinada"))
            .await
            .unwrap();
        backend.update_stream_active(stream.id, false).await.unwrap();

        let result = backend
            .insert_frame(NewFrame::new(stream.id, 1, jpeg_stub()))
            .await;
        assert!(matches!(result, Err(BackendError::StreamNotActive(_))));
    }

    #[tokio::test]
    async fn test_frame_retention() {
        let config = BackendConfig::default().frame_retention(3);
        let backend = MemoryBackend::with_config(config);
        let stream = backend
            .insert_stream(UserId::new(), &StreamStart::new("Test Feed", "Kakinada"))
            .await
            .unwrap();

        for seq in 1..=5 {
            backend
                .insert_frame(NewFrame::new(stream.id, seq, jpeg_stub()))
                .await
                .unwrap();
        }

        assert_eq!(backend.frame_count(stream.id).await, 3);
        assert_eq!(
            backend.latest_frame(stream.id).await.unwrap().unwrap().sequence,
            5
        );
    }

    #[tokio::test]
    async fn test_active_streams_newest_first() {
        let backend = MemoryBackend::new();
        let first = backend
            .insert_stream(UserId::new(), &StreamStart::new("first", "x"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = backend
            .insert_stream(UserId::new(), &StreamStart::new("second", "y"))
            .await
            .unwrap();
        let stopped = backend
            .insert_stream(UserId::new(), &StreamStart::new("stopped", "z"))
            .await
            .unwrap();
        backend.update_stream_active(stopped.id, false).await.unwrap();

        let active = backend.active_streams().await.unwrap();
        let ids: Vec<_> = active.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_delete_closes_frame_subscription() {
        let backend = MemoryBackend::new();
        let stream = backend
            .insert_stream(UserId::new(), &StreamStart::new("Test Feed", "Kakinada"))
            .await
            .unwrap();
        let mut rx = backend.subscribe_frames(stream.id).await.unwrap();
        let mut changes = backend.subscribe_streams().await.unwrap();

        backend.delete_stream(stream.id).await.unwrap();

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert_eq!(
            changes.recv().await.unwrap(),
            StreamChange::Deleted(stream.id)
        );
        assert!(matches!(
            backend.delete_stream(stream.id).await,
            Err(BackendError::StreamNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_presence_updates_viewer_count() {
        let backend = MemoryBackend::new();
        let stream = backend
            .insert_stream(UserId::new(), &StreamStart::new("Test Feed", "Kakinada"))
            .await
            .unwrap();
        let mut changes = backend.subscribe_streams().await.unwrap();
        let viewer = UserId::new();

        backend.upsert_presence(stream.id, viewer).await.unwrap();
        assert_eq!(backend.viewer_count(stream.id).await.unwrap(), 1);

        match changes.recv().await.unwrap() {
            StreamChange::Updated(s) => assert_eq!(s.viewer_count, 1),
            other => panic!("unexpected change: {:?}", other),
        }

        // Heartbeat from the same viewer does not double count
        backend.upsert_presence(stream.id, viewer).await.unwrap();
        assert_eq!(backend.viewer_count(stream.id).await.unwrap(), 1);

        backend.delete_presence(stream.id, viewer).await.unwrap();
        assert_eq!(backend.viewer_count(stream.id).await.unwrap(), 0);
        assert_eq!(backend.stream(stream.id).await.unwrap().viewer_count, 0);
    }

    #[tokio::test]
    async fn test_sweep_expires_silent_viewers() {
        let config = BackendConfig::default().presence_expiry(Duration::from_millis(50));
        let backend = MemoryBackend::with_config(config);
        let stream = backend
            .insert_stream(UserId::new(), &StreamStart::new("Test Feed", "Kakinada"))
            .await
            .unwrap();
        let viewer = UserId::new();

        backend.upsert_presence(stream.id, viewer).await.unwrap();
        assert_eq!(backend.stream(stream.id).await.unwrap().viewer_count, 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(backend.viewer_count(stream.id).await.unwrap(), 0);

        backend.sweep_presence().await;
        assert!(backend.presence(stream.id, viewer).await.is_none());
        assert_eq!(backend.stream(stream.id).await.unwrap().viewer_count, 0);
    }
}
