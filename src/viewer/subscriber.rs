//! Frame subscription
//!
//! Feeds the viewer buffer: the latest frame first (so a late joiner shows
//! something immediately), then every new frame the service delivers.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;

use crate::backend::RealtimeBackend;
use crate::model::{Frame, StreamId};
use crate::stats::ViewerCounters;

use super::buffer::{FrameBuffer, PushOutcome};
use super::state::StateTracker;

/// Subscription feeding one stream's frames into a buffer
pub struct FrameSubscriber {
    backend: Arc<dyn RealtimeBackend>,
    stream_id: StreamId,
    buffer: Arc<Mutex<FrameBuffer>>,
    state: StateTracker,
    counters: Arc<ViewerCounters>,
}

impl FrameSubscriber {
    pub fn new(
        backend: Arc<dyn RealtimeBackend>,
        stream_id: StreamId,
        buffer: Arc<Mutex<FrameBuffer>>,
        state: StateTracker,
        counters: Arc<ViewerCounters>,
    ) -> Self {
        Self {
            backend,
            stream_id,
            buffer,
            state,
            counters,
        }
    }

    /// Run until the subscription closes or fails
    ///
    /// The live channel is opened before the latest frame is fetched, so a
    /// frame published in between is not lost; the buffer drops the
    /// duplicate if both paths deliver it. Failures put the state in
    /// `Error` and end the task.
    pub async fn run(self) {
        self.state.connecting();

        let mut frames = match self.backend.subscribe_frames(self.stream_id).await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::warn!(stream = %self.stream_id, error = %e, "Frame subscription failed");
                self.state.fail(e.to_string());
                return;
            }
        };

        match self.backend.latest_frame(self.stream_id).await {
            Ok(Some(frame)) => self.accept(frame).await,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(stream = %self.stream_id, error = %e, "Latest frame fetch failed");
                self.state.fail(e.to_string());
                return;
            }
        }

        self.state.connected();
        tracing::debug!(stream = %self.stream_id, "Viewer subscribed");

        loop {
            match frames.recv().await {
                Ok(frame) => self.accept(frame).await,
                Err(RecvError::Lagged(missed)) => {
                    self.counters.frames_lagged.fetch_add(missed, Ordering::Relaxed);
                    tracing::debug!(stream = %self.stream_id, missed = missed, "Viewer lagged");
                }
                Err(RecvError::Closed) => {
                    tracing::info!(stream = %self.stream_id, "Frame subscription closed");
                    self.state.fail("subscription closed");
                    return;
                }
            }
        }
    }

    async fn accept(&self, frame: Frame) {
        // Foreign rows never reach the buffer
        if frame.stream_id != self.stream_id {
            return;
        }
        self.counters.frames_received.fetch_add(1, Ordering::Relaxed);

        let sequence = frame.sequence;
        let outcome = self.buffer.lock().await.push(frame);
        match outcome {
            PushOutcome::Buffered => {}
            PushOutcome::Evicted(evicted) => {
                self.counters.frames_evicted.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(stream = %self.stream_id, evicted, "Buffer full, oldest frame evicted");
            }
            PushOutcome::Stale | PushOutcome::Duplicate => {
                self.counters.frames_stale.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(stream = %self.stream_id, sequence, "Stale frame dropped");
            }
        }
    }
}
