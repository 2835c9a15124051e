//! Stream directory
//!
//! A client-side view of the active streams, kept current by the service's
//! change feed:
//! - an insert or update of an active row moves it to the front
//! - an update to an inactive row or a delete removes it
//! - the currently selected stream follows its row, and is cleared when the
//!   row goes inactive or is deleted
//!
//! Starting, stopping and removing streams are gated by the caller's admin
//! flag. The flag is a client-side check only; the service enforces its own
//! row-level rules.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

use crate::backend::RealtimeBackend;
use crate::error::{Error, Result};
use crate::model::{Stream, StreamChange, StreamId, StreamStart, UserId};

/// Who is performing a directory operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Caller {
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    pub fn viewer(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    fn require_admin(&self, action: &str) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            tracing::warn!(user = %self.user_id, action = action, "Non-admin stream operation rejected");
            Err(Error::PermissionDenied(format!("Only admins can {}", action)))
        }
    }
}

/// Active streams plus the current selection
pub struct StreamDirectory {
    backend: Arc<dyn RealtimeBackend>,
    streams: RwLock<Vec<Stream>>,
    current: watch::Sender<Option<Stream>>,
}

impl StreamDirectory {
    pub fn new(backend: Arc<dyn RealtimeBackend>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            backend,
            streams: RwLock::new(Vec::new()),
            current,
        }
    }

    /// Service this directory talks to
    pub fn backend(&self) -> &Arc<dyn RealtimeBackend> {
        &self.backend
    }

    /// Load active streams, newest first
    ///
    /// Selects the first stream when nothing is selected yet.
    pub async fn load(&self) -> Result<Vec<Stream>> {
        let active = self.backend.active_streams().await?;

        *self.streams.write().await = active.clone();

        let current_id = self.current.borrow().as_ref().map(|s| s.id);
        let next = match current_id {
            Some(id) => active.iter().find(|s| s.id == id).cloned(),
            None => active.first().cloned(),
        };
        self.current.send_replace(next);

        tracing::debug!(count = active.len(), "Active streams loaded");
        Ok(active)
    }

    /// Apply one change event
    pub async fn apply(&self, change: &StreamChange) {
        let mut streams = self.streams.write().await;
        let id = change.stream_id();
        streams.retain(|s| s.id != id);

        match change {
            StreamChange::Inserted(stream) | StreamChange::Updated(stream) if stream.is_active => {
                streams.insert(0, stream.clone());
            }
            _ => {}
        }
        drop(streams);

        self.current.send_if_modified(|current| {
            if current.as_ref().map(|s| s.id) != Some(id) {
                return false;
            }
            match change {
                StreamChange::Inserted(stream) | StreamChange::Updated(stream)
                    if stream.is_active =>
                {
                    *current = Some(stream.clone());
                }
                _ => {
                    tracing::info!(stream = %id, "Selected stream ended");
                    *current = None;
                }
            }
            true
        });
    }

    /// Follow the service's change feed until it closes
    ///
    /// Subscribes before loading so no change between the two is missed.
    /// A lagging feed triggers a full reload.
    pub async fn spawn_sync(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let mut changes = self.backend.subscribe_streams().await?;
        self.load().await?;

        let directory = Arc::clone(self);
        Ok(tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => directory.apply(&change).await,
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed = missed, "Directory feed lagged, reloading");
                        if let Err(e) = directory.load().await {
                            tracing::warn!(error = %e, "Directory reload failed");
                        }
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Directory feed closed");
                        break;
                    }
                }
            }
        }))
    }

    /// Snapshot of the active streams, newest first
    pub async fn active(&self) -> Vec<Stream> {
        self.streams.read().await.clone()
    }

    /// Currently selected stream
    pub fn current(&self) -> Option<Stream> {
        self.current.borrow().clone()
    }

    /// Watch the current selection
    pub fn watch_current(&self) -> watch::Receiver<Option<Stream>> {
        self.current.subscribe()
    }

    /// Select an active stream
    ///
    /// Returns `None` (and leaves the selection alone) if the stream is not
    /// in the active list.
    pub async fn select(&self, stream_id: StreamId) -> Option<Stream> {
        let stream = self
            .streams
            .read()
            .await
            .iter()
            .find(|s| s.id == stream_id)
            .cloned()?;

        self.current.send_replace(Some(stream.clone()));
        Some(stream)
    }

    /// Create an active stream row owned by the caller
    pub async fn start_stream(&self, caller: &Caller, start: &StreamStart) -> Result<Stream> {
        caller.require_admin("start streams")?;

        let stream = self.backend.insert_stream(caller.user_id, start).await?;
        self.apply(&StreamChange::Inserted(stream.clone())).await;

        tracing::info!(stream = %stream.id, name = %stream.stream_name, "Stream started");
        Ok(stream)
    }

    /// Mark a stream inactive
    pub async fn stop_stream(&self, caller: &Caller, stream_id: StreamId) -> Result<Stream> {
        caller.require_admin("stop streams")?;

        let stream = self.backend.update_stream_active(stream_id, false).await?;
        self.apply(&StreamChange::Updated(stream.clone())).await;

        tracing::info!(stream = %stream_id, "Stream stopped");
        Ok(stream)
    }

    /// Delete a stream row
    pub async fn remove_stream(&self, caller: &Caller, stream_id: StreamId) -> Result<()> {
        caller.require_admin("remove streams")?;

        self.backend.delete_stream(stream_id).await?;
        self.apply(&StreamChange::Deleted(stream_id)).await;

        tracing::info!(stream = %stream_id, "Stream removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::backend::MemoryBackend;

    fn directory() -> (Arc<MemoryBackend>, Arc<StreamDirectory>) {
        let backend = Arc::new(MemoryBackend::new());
        let directory = Arc::new(StreamDirectory::new(backend.clone()));
        (backend, directory)
    }

    #[tokio::test]
    async fn test_non_admin_cannot_start() {
        let (backend, directory) = directory();
        let caller = Caller::viewer(UserId::new());

        let err = directory
            .start_stream(&caller, &StreamStart::new("Test Feed", "Depot"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::PermissionDenied(_)));
        assert!(err.user_message().contains("Only admins can start streams"));
        assert_eq!(backend.stream_count().await, 0);
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let (backend, directory) = directory();
        let caller = Caller::admin(UserId::new());

        let stream = directory
            .start_stream(&caller, &StreamStart::new("Test Feed", "Depot"))
            .await
            .unwrap();
        assert!(stream.is_active);
        assert_eq!(directory.active().await.len(), 1);

        let stopped = directory.stop_stream(&caller, stream.id).await.unwrap();
        assert!(!stopped.is_active);
        assert!(directory.active().await.is_empty());
        assert!(!backend.stream(stream.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_load_selects_newest() {
        let (backend, directory) = directory();
        let admin = UserId::new();

        backend
            .insert_stream(admin, &StreamStart::new("Older", "A"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let newer = backend
            .insert_stream(admin, &StreamStart::new("Newer", "B"))
            .await
            .unwrap();

        let active = directory.load().await.unwrap();

        assert_eq!(active.len(), 2);
        assert_eq!(active[0].id, newer.id);
        assert_eq!(directory.current().unwrap().id, newer.id);
    }

    #[tokio::test]
    async fn test_apply_moves_and_removes() {
        let (_backend, directory) = directory();
        let admin = UserId::new();
        let a = Stream::from_start(admin, &StreamStart::new("A", "x"));
        let b = Stream::from_start(admin, &StreamStart::new("B", "y"));

        directory.apply(&StreamChange::Inserted(a.clone())).await;
        directory.apply(&StreamChange::Inserted(b.clone())).await;
        assert_eq!(directory.active().await[0].id, b.id);

        // Update of an active row moves it to the front
        directory.apply(&StreamChange::Updated(a.clone())).await;
        assert_eq!(directory.active().await[0].id, a.id);

        let mut ended = a.clone();
        ended.is_active = false;
        directory.apply(&StreamChange::Updated(ended)).await;
        let ids: Vec<_> = directory.active().await.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![b.id]);

        directory.apply(&StreamChange::Deleted(b.id)).await;
        assert!(directory.active().await.is_empty());
    }

    #[tokio::test]
    async fn test_current_cleared_when_selected_stream_ends() {
        let (_backend, directory) = directory();
        let caller = Caller::admin(UserId::new());

        let stream = directory
            .start_stream(&caller, &StreamStart::new("Test Feed", "Depot"))
            .await
            .unwrap();
        assert!(directory.select(stream.id).await.is_some());

        directory.stop_stream(&caller, stream.id).await.unwrap();

        assert!(directory.current().is_none());
        assert!(directory.select(stream.id).await.is_none());
    }

    #[tokio::test]
    async fn test_sync_follows_other_clients() {
        let (backend, directory) = directory();
        let sync = directory.spawn_sync().await.unwrap();
        let mut current = directory.watch_current();

        // Another admin starts a stream
        let stream = backend
            .insert_stream(UserId::new(), &StreamStart::new("Remote", "Field"))
            .await
            .unwrap();
        directory.apply(&StreamChange::Inserted(stream.clone())).await;
        directory.select(stream.id).await.unwrap();
        current.changed().await.unwrap();

        backend.delete_stream(stream.id).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), async {
            while current.borrow_and_update().is_some() {
                current.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        assert!(directory.active().await.is_empty());
        sync.abort();
    }
}
