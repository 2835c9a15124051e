//! Frame publisher
//!
//! Appends encoded frames to the shared frame log. Publishing is
//! best-effort: a failed insert is logged and counted, never retried, and
//! the sampler keeps going.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;

use crate::backend::RealtimeBackend;
use crate::model::{NewFrame, StreamId};
use crate::stats::BroadcastCounters;

/// Events emitted by a running broadcast
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastEvent {
    /// Stream row created and the sampler is running
    Publishing(StreamId),

    /// Capture stopped producing frames; the message is user-facing
    CaptureLost(String),

    /// Stream row deactivated
    Stopped(StreamId),
}

/// Publishes frames for one stream
pub struct FramePublisher {
    backend: Arc<dyn RealtimeBackend>,
    stream_id: StreamId,
    counters: Arc<BroadcastCounters>,
}

impl FramePublisher {
    pub fn new(
        backend: Arc<dyn RealtimeBackend>,
        stream_id: StreamId,
        counters: Arc<BroadcastCounters>,
    ) -> Self {
        Self {
            backend,
            stream_id,
            counters,
        }
    }

    /// Stream the publisher writes to
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Insert one frame row
    ///
    /// Returns whether the frame log accepted it.
    pub async fn publish(&self, sequence: u64, payload: Bytes) -> bool {
        let size = payload.len() as u64;
        let frame = NewFrame::new(self.stream_id, sequence, payload);

        match self.backend.insert_frame(frame).await {
            Ok(_) => {
                self.counters.frames_published.fetch_add(1, Ordering::Relaxed);
                self.counters.bytes_published.fetch_add(size, Ordering::Relaxed);
                tracing::trace!(stream = %self.stream_id, sequence, size, "Frame published");
                true
            }
            Err(e) => {
                self.counters.frames_failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    stream = %self.stream_id,
                    sequence,
                    error = %e,
                    "Frame insert failed, dropping frame"
                );
                false
            }
        }
    }
}
