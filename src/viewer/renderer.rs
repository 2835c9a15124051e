//! Render loop
//!
//! Pops at most one frame per tick and shows it. When the buffer is empty
//! the last frame stays on screen.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::MIN_INTERVAL;
use crate::model::Frame;
use crate::stats::ViewerCounters;

use super::buffer::FrameBuffer;

/// Drains one subscription's buffer onto the shared display
pub struct RenderLoop {
    buffer: Arc<Mutex<FrameBuffer>>,
    display: Arc<watch::Sender<Option<Frame>>>,
    generation: Arc<AtomicU64>,
    owner: u64,
    counters: Arc<ViewerCounters>,
}

impl RenderLoop {
    pub fn new(
        buffer: Arc<Mutex<FrameBuffer>>,
        display: Arc<watch::Sender<Option<Frame>>>,
        generation: Arc<AtomicU64>,
        owner: u64,
        counters: Arc<ViewerCounters>,
    ) -> Self {
        Self {
            buffer,
            display,
            generation,
            owner,
            counters,
        }
    }

    /// Render one frame if one is buffered
    ///
    /// Returns the rendered sequence. Nothing is shown once the session has
    /// moved on to another generation, even if a frame was already popped.
    pub async fn tick(&self) -> Option<u64> {
        let frame = self.buffer.lock().await.pop()?;
        let sequence = frame.sequence;

        let shown = self.display.send_if_modified(|current| {
            if self.generation.load(Ordering::Acquire) != self.owner {
                return false;
            }
            *current = Some(frame);
            true
        });

        if shown {
            self.counters.frames_rendered.fetch_add(1, Ordering::Relaxed);
            Some(sequence)
        } else {
            None
        }
    }

    /// Run at `interval` until aborted or superseded
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            while self.generation.load(Ordering::Acquire) == self.owner {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }
}
