//! Per-stream state held by the in-memory service
//!
//! One entry bundles the directory row, the retained tail of the frame log,
//! the live fan-out channel and the presence rows of a single stream.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::model::{Frame, PresenceRecord, Stream, UserId};

use super::config::BackendConfig;

/// Entry for a single stream in the service
pub struct StreamEntry {
    /// Directory row
    pub stream: Stream,

    /// Retained frames, oldest first
    frames: VecDeque<Frame>,

    /// Broadcast sender for frames filtered to this stream
    tx: broadcast::Sender<Frame>,

    /// Presence rows keyed by viewer
    viewers: HashMap<UserId, PresenceRecord>,
}

impl StreamEntry {
    /// Create a new entry for a freshly inserted row
    pub(super) fn new(stream: Stream, config: &BackendConfig) -> Self {
        let (tx, _) = broadcast::channel(config.broadcast_capacity);

        Self {
            stream,
            frames: VecDeque::with_capacity(config.frame_retention),
            tx,
            viewers: HashMap::new(),
        }
    }

    /// Subscribe to frames appended after this call
    pub(super) fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.tx.subscribe()
    }

    /// Append a frame, prune past `retention`, and fan it out
    ///
    /// Returns the number of live subscribers that received it.
    pub(super) fn append(&mut self, frame: Frame, retention: usize) -> usize {
        self.frames.push_back(frame.clone());
        while self.frames.len() > retention {
            self.frames.pop_front();
        }

        // send() only fails when nobody is listening
        self.tx.send(frame).unwrap_or(0)
    }

    /// The frame with the highest sequence number
    pub fn latest(&self) -> Option<&Frame> {
        self.frames.iter().max_by_key(|f| f.sequence)
    }

    /// Number of retained frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of live frame subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Insert or refresh a viewer's presence row
    pub(super) fn touch_viewer(&mut self, viewer_id: UserId) -> PresenceRecord {
        let record = PresenceRecord::new(self.stream.id, viewer_id);
        self.viewers.insert(viewer_id, record.clone());
        record
    }

    /// Remove a viewer's presence row
    pub(super) fn remove_viewer(&mut self, viewer_id: &UserId) -> bool {
        self.viewers.remove(viewer_id).is_some()
    }

    /// Presence row for a viewer, if any
    pub fn presence(&self, viewer_id: &UserId) -> Option<&PresenceRecord> {
        self.viewers.get(viewer_id)
    }

    /// Count viewers whose last heartbeat is within `expiry`
    pub fn fresh_viewer_count(&self, now: DateTime<Utc>, expiry: Duration) -> u32 {
        self.viewers
            .values()
            .filter(|r| r.is_fresh(now, expiry))
            .count() as u32
    }

    /// Drop presence rows older than `expiry`, returning how many were removed
    pub(super) fn purge_stale(&mut self, now: DateTime<Utc>, expiry: Duration) -> usize {
        let before = self.viewers.len();
        self.viewers.retain(|_, r| r.is_fresh(now, expiry));
        before - self.viewers.len()
    }

    /// Recompute `viewer_count`, returning true if it changed
    pub(super) fn recount(&mut self, now: DateTime<Utc>, expiry: Duration) -> bool {
        let count = self.fresh_viewer_count(now, expiry);
        if count != self.stream.viewer_count {
            self.stream.viewer_count = count;
            self.stream.updated_at = now;
            true
        } else {
            false
        }
    }
}
