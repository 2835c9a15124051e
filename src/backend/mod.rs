//! Realtime service contract
//!
//! Persistence, fan-out and presence all live in a hosted realtime database.
//! This module is the seam to it: [`RealtimeBackend`] names every call the
//! pipeline makes, and [`MemoryBackend`] implements the same contract in
//! process for tests, demos and single-node deployments.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<dyn RealtimeBackend>
//!                   ┌──────────────────────────────┐
//!                   │ streams: HashMap<StreamId,   │
//!                   │   StreamEntry {              │
//!                   │     stream row,              │
//!                   │     frames (retained tail),  │
//!                   │     tx: broadcast::Tx,       │
//!                   │     viewers (presence),      │
//!                   │   }                          │
//!                   │ >                            │
//!                   │ changes: broadcast::Tx       │
//!                   └──────────────┬───────────────┘
//!                                  │
//!        ┌─────────────────────────┼─────────────────────────┐
//!        │                         │                         │
//!        ▼                         ▼                         ▼
//!  [BroadcastSession]       [ViewerSession]           [StreamDirectory]
//!  insert_frame()           subscribe_frames()        subscribe_streams()
//!                           upsert_presence()
//! ```
//!
//! Delivery is at-most-once: an insert that fails is never retried, and a
//! subscriber that lags behind its channel simply misses frames.

pub mod config;
pub mod entry;
pub mod error;
pub mod memory;

pub use config::BackendConfig;
pub use entry::StreamEntry;
pub use error::BackendError;
pub use memory::MemoryBackend;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::model::{Frame, NewFrame, PresenceRecord, Stream, StreamChange, StreamId, StreamStart, UserId};

/// Every call the pipeline makes against the realtime service
#[async_trait]
pub trait RealtimeBackend: Send + Sync + 'static {
    /// Append a frame row to the shared frame log
    async fn insert_frame(&self, frame: NewFrame) -> Result<Frame, BackendError>;

    /// Most recently published frame of a stream (highest sequence number)
    async fn latest_frame(&self, stream_id: StreamId) -> Result<Option<Frame>, BackendError>;

    /// Live notifications of new frame rows whose stream id equals `stream_id`
    async fn subscribe_frames(
        &self,
        stream_id: StreamId,
    ) -> Result<broadcast::Receiver<Frame>, BackendError>;

    /// Insert an active directory row owned by `admin_id`
    async fn insert_stream(
        &self,
        admin_id: UserId,
        start: &StreamStart,
    ) -> Result<Stream, BackendError>;

    /// Set the active flag (and `updated_at`) of a directory row
    async fn update_stream_active(
        &self,
        stream_id: StreamId,
        active: bool,
    ) -> Result<Stream, BackendError>;

    /// Delete a directory row
    async fn delete_stream(&self, stream_id: StreamId) -> Result<(), BackendError>;

    /// All rows flagged active, newest first
    async fn active_streams(&self) -> Result<Vec<Stream>, BackendError>;

    /// Insert/update/delete notifications for the directory table
    async fn subscribe_streams(&self) -> Result<broadcast::Receiver<StreamChange>, BackendError>;

    /// Upsert the presence row for (stream, viewer) with `last_seen = now`
    async fn upsert_presence(
        &self,
        stream_id: StreamId,
        viewer_id: UserId,
    ) -> Result<PresenceRecord, BackendError>;

    /// Delete the presence row for (stream, viewer)
    async fn delete_presence(&self, stream_id: StreamId, viewer_id: UserId)
        -> Result<(), BackendError>;

    /// Service-side viewer count derived from presence recency
    async fn viewer_count(&self, stream_id: StreamId) -> Result<u32, BackendError>;
}
