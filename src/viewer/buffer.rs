//! Viewer frame buffer
//!
//! Absorbs network jitter between the subscription and the render loop.
//! Frames are kept ordered by sequence number. When full, the lowest
//! sequence is evicted. Frames at or below the last rendered sequence are
//! stale and dropped on arrival, so the rendered sequence never goes
//! backwards even when deliveries arrive out of order.

use std::collections::VecDeque;

use crate::model::Frame;

/// Result of pushing a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Frame buffered
    Buffered,
    /// Buffer was full; the frame with this sequence was evicted
    Evicted(u64),
    /// Frame is at or below the last rendered sequence
    Stale,
    /// Frame with the same sequence is already buffered
    Duplicate,
}

/// Bounded, sequence-ordered frame buffer
#[derive(Debug)]
pub struct FrameBuffer {
    capacity: usize,
    /// Ascending by sequence
    frames: VecDeque<Frame>,
    last_popped: Option<u64>,
}

impl FrameBuffer {
    /// Create a buffer holding at most `capacity` frames (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity + 1),
            last_popped: None,
        }
    }

    /// Add a frame
    pub fn push(&mut self, frame: Frame) -> PushOutcome {
        if self.last_popped.is_some_and(|last| frame.sequence <= last) {
            return PushOutcome::Stale;
        }

        let pos = match self
            .frames
            .binary_search_by_key(&frame.sequence, |f| f.sequence)
        {
            Ok(_) => return PushOutcome::Duplicate,
            Err(pos) => pos,
        };
        self.frames.insert(pos, frame);

        if self.frames.len() > self.capacity {
            if let Some(evicted) = self.frames.pop_front() {
                return PushOutcome::Evicted(evicted.sequence);
            }
        }

        PushOutcome::Buffered
    }

    /// Take the lowest-sequence frame
    pub fn pop(&mut self) -> Option<Frame> {
        let frame = self.frames.pop_front()?;
        self.last_popped = Some(frame.sequence);
        Some(frame)
    }

    /// Drop every frame and forget the rendered position
    pub fn clear(&mut self) {
        self.frames.clear();
        self.last_popped = None;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sequence of the last frame handed to the renderer
    pub fn last_popped(&self) -> Option<u64> {
        self.last_popped
    }

    /// Lowest and highest buffered sequence
    pub fn sequence_range(&self) -> Option<(u64, u64)> {
        match (self.frames.front(), self.frames.back()) {
            (Some(first), Some(last)) => Some((first.sequence, last.sequence)),
            _ => None,
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::model::{NewFrame, StreamId};

    fn frame(sequence: u64) -> Frame {
        Frame::from_new(NewFrame::new(
            StreamId::new(),
            sequence,
            Bytes::from_static(&[0xFF, 0xD8]),
        ))
    }

    #[test]
    fn test_pops_in_sequence_order() {
        let mut buffer = FrameBuffer::new(10);
        buffer.push(frame(3));
        buffer.push(frame(1));
        buffer.push(frame(2));

        let order: Vec<u64> = std::iter::from_fn(|| buffer.pop()).map(|f| f.sequence).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut buffer = FrameBuffer::new(10);
        for seq in 1..=10 {
            assert_eq!(buffer.push(frame(seq)), PushOutcome::Buffered);
        }

        assert_eq!(buffer.push(frame(11)), PushOutcome::Evicted(1));
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.sequence_range(), Some((2, 11)));
    }

    #[test]
    fn test_stale_and_duplicate_dropped() {
        let mut buffer = FrameBuffer::new(4);
        buffer.push(frame(5));
        assert_eq!(buffer.push(frame(5)), PushOutcome::Duplicate);

        assert_eq!(buffer.pop().unwrap().sequence, 5);
        assert_eq!(buffer.push(frame(4)), PushOutcome::Stale);
        assert_eq!(buffer.push(frame(5)), PushOutcome::Stale);
        assert_eq!(buffer.push(frame(6)), PushOutcome::Buffered);
    }

    #[test]
    fn test_clear_resets_position() {
        let mut buffer = FrameBuffer::new(4);
        buffer.push(frame(9));
        buffer.pop();

        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.last_popped(), None);
        assert_eq!(buffer.push(frame(1)), PushOutcome::Buffered);
    }

    #[test]
    fn test_minimum_capacity() {
        let mut buffer = FrameBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);

        buffer.push(frame(1));
        assert_eq!(buffer.push(frame(2)), PushOutcome::Evicted(1));
    }
}
