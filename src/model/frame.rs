//! Frame rows and stream identifiers
//!
//! A frame is one encoded camera image appended to the shared frame log.
//! Rows are append-only: nothing in this crate updates a frame after insert.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// MIME type of every frame payload produced by the sampler
pub const FRAME_MIME: &str = "image/jpeg";

/// Unique identifier for a stream row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub Uuid);

impl StreamId {
    /// Generate a fresh random stream id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of an authenticated user (broadcaster or viewer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A frame about to be appended to the log
///
/// Cheap to clone: the payload is reference counted.
#[derive(Debug, Clone)]
pub struct NewFrame {
    /// Owning stream
    pub stream_id: StreamId,
    /// Per-stream sequence number assigned by the broadcaster
    pub sequence: u64,
    /// Encoded image bytes
    pub payload: Bytes,
}

impl NewFrame {
    pub fn new(stream_id: StreamId, sequence: u64, payload: Bytes) -> Self {
        Self {
            stream_id,
            sequence,
            payload,
        }
    }
}

/// A frame row as stored by the realtime service
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Owning stream
    pub stream_id: StreamId,
    /// Per-stream sequence number (non-decreasing in publish order)
    pub sequence: u64,
    /// Encoded image bytes (zero-copy via reference counting)
    pub payload: Bytes,
    /// When the service stored the row
    pub created_at: DateTime<Utc>,
}

impl Frame {
    /// Stamp a new frame with the current time
    pub fn from_new(frame: NewFrame) -> Self {
        Self {
            stream_id: frame.stream_id,
            sequence: frame.sequence,
            payload: frame.payload,
            created_at: Utc::now(),
        }
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Render the payload as a `data:` URL for web clients
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", FRAME_MIME, STANDARD.encode(&self.payload))
    }

    /// Check for the JPEG start-of-image marker
    pub fn looks_like_jpeg(&self) -> bool {
        self.payload.starts_with(&[0xFF, 0xD8])
    }
}
