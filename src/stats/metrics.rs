//! Statistics for broadcasts and viewers

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Broadcast-side statistics snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BroadcastStats {
    /// Frames read and encoded by the sampler
    pub frames_sampled: u64,
    /// Frames accepted by the frame log
    pub frames_published: u64,
    /// Frames the frame log rejected or that failed to encode (never retried)
    pub frames_failed: u64,
    /// Ticks skipped because the camera was not ready
    pub ticks_skipped: u64,
    /// Total payload bytes published
    pub bytes_published: u64,
    /// Time since the broadcast started
    pub duration: Duration,
}

impl BroadcastStats {
    /// Published frames per second over the whole broadcast
    pub fn publish_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.frames_published as f64 / secs
        } else {
            0.0
        }
    }

    /// Average payload size in bytes
    pub fn average_frame_size(&self) -> u64 {
        if self.frames_published > 0 {
            self.bytes_published / self.frames_published
        } else {
            0
        }
    }
}

/// Live broadcast counters, shared between the sampler task and its owner
#[derive(Debug)]
pub struct BroadcastCounters {
    started_at: Instant,
    pub frames_sampled: AtomicU64,
    pub frames_published: AtomicU64,
    pub frames_failed: AtomicU64,
    pub ticks_skipped: AtomicU64,
    pub bytes_published: AtomicU64,
}

impl BroadcastCounters {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_sampled: AtomicU64::new(0),
            frames_published: AtomicU64::new(0),
            frames_failed: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            bytes_published: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> BroadcastStats {
        BroadcastStats {
            frames_sampled: self.frames_sampled.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            frames_failed: self.frames_failed.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            bytes_published: self.bytes_published.load(Ordering::Relaxed),
            duration: self.started_at.elapsed(),
        }
    }
}

impl Default for BroadcastCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Viewer-side statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerStats {
    /// Frames delivered by the subscription (including the initial fetch)
    pub frames_received: u64,
    /// Frames shown by the render loop
    pub frames_rendered: u64,
    /// Frames evicted from a full buffer
    pub frames_evicted: u64,
    /// Frames dropped as stale or duplicate
    pub frames_stale: u64,
    /// Frames the subscription missed by lagging behind the channel
    pub frames_lagged: u64,
}

impl ViewerStats {
    /// Frames that arrived but were never shown
    pub fn frames_dropped(&self) -> u64 {
        self.frames_evicted + self.frames_stale
    }
}

/// Live viewer counters
#[derive(Debug, Default)]
pub struct ViewerCounters {
    pub frames_received: AtomicU64,
    pub frames_rendered: AtomicU64,
    pub frames_evicted: AtomicU64,
    pub frames_stale: AtomicU64,
    pub frames_lagged: AtomicU64,
}

impl ViewerCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ViewerStats {
        ViewerStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            frames_evicted: self.frames_evicted.load(Ordering::Relaxed),
            frames_stale: self.frames_stale.load(Ordering::Relaxed),
            frames_lagged: self.frames_lagged.load(Ordering::Relaxed),
        }
    }
}
