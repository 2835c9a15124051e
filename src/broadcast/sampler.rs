//! Frame sampler
//!
//! Reads the camera's current frame at native resolution and encodes it as
//! JPEG. Each successfully encoded frame takes the next sequence number.
//! Capture and encoding are separate steps so the broadcast loop can move
//! the encode off the async workers.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;

use crate::capture::{CaptureSource, RawFrame};
use crate::error::Result;
use crate::stats::BroadcastCounters;

use super::encoder::encode_jpeg;

/// An encoded frame ready for publishing
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub payload: Bytes,
}

/// Turns camera reads into sequenced JPEG payloads
pub struct FrameSampler {
    source: Box<dyn CaptureSource>,
    quality: u8,
    sequence: u64,
    counters: Arc<BroadcastCounters>,
}

impl FrameSampler {
    /// Create a sampler owning `source`
    pub fn new(source: Box<dyn CaptureSource>, quality: u8, counters: Arc<BroadcastCounters>) -> Self {
        Self {
            source,
            quality,
            sequence: 0,
            counters,
        }
    }

    /// Sequence number of the last sampled frame (0 before the first)
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// JPEG quality used for encoding
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Read the camera's current frame
    ///
    /// Returns `Ok(None)` when the camera is not ready yet; that tick is
    /// simply skipped.
    pub fn capture(&mut self) -> Result<Option<RawFrame>> {
        if !self.source.is_ready() {
            self.counters.ticks_skipped.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Camera not ready, skipping tick");
            return Ok(None);
        }

        Ok(Some(self.source.read_frame()?))
    }

    /// Assign the next sequence number to an encoded payload
    pub fn commit(&mut self, width: u32, height: u32, payload: Bytes) -> SampledFrame {
        self.sequence += 1;
        self.counters.frames_sampled.fetch_add(1, Ordering::Relaxed);

        SampledFrame {
            sequence: self.sequence,
            width,
            height,
            payload,
        }
    }

    /// Capture, encode and sequence one frame on the current thread
    pub fn sample(&mut self) -> Result<Option<SampledFrame>> {
        let Some(raw) = self.capture()? else {
            return Ok(None);
        };
        let payload = encode_jpeg(&raw, self.quality)?;

        Ok(Some(self.commit(raw.width, raw.height, payload)))
    }

    /// Release the camera
    pub fn stop(&mut self) {
        self.source.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::capture::{CaptureConstraints, CaptureDevice, TestPatternDevice};

    fn sampler_for(device: &TestPatternDevice) -> (FrameSampler, Arc<BroadcastCounters>) {
        let counters = Arc::new(BroadcastCounters::new());
        let source = device.open(&CaptureConstraints::relaxed()).unwrap();
        (FrameSampler::new(source, 70, Arc::clone(&counters)), counters)
    }

    #[test]
    fn test_sequence_increments_per_frame() {
        let device = TestPatternDevice::new(16, 12);
        let (mut sampler, counters) = sampler_for(&device);

        let first = sampler.sample().unwrap().unwrap();
        let second = sampler.sample().unwrap().unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!((first.width, first.height), (16, 12));
        assert!(first.payload.starts_with(&[0xFF, 0xD8]));
        assert_eq!(counters.snapshot().frames_sampled, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_ready_tick_is_skipped() {
        let device = TestPatternDevice::new(8, 8).with_warmup(Duration::from_millis(300));
        let (mut sampler, counters) = sampler_for(&device);

        assert!(sampler.sample().unwrap().is_none());
        assert_eq!(sampler.sequence(), 0);
        assert_eq!(counters.snapshot().ticks_skipped, 1);

        tokio::time::advance(Duration::from_millis(300)).await;
        assert_eq!(sampler.sample().unwrap().unwrap().sequence, 1);
    }

    #[test]
    fn test_failed_encode_takes_no_sequence() {
        let device = TestPatternDevice::new(8, 8);
        let (mut sampler, counters) = sampler_for(&device);

        let raw = sampler.capture().unwrap().unwrap();
        assert!(encode_jpeg(&RawFrame { rgba: Vec::new(), ..raw.clone() }, 70).is_err());
        assert_eq!(sampler.sequence(), 0);

        let payload = encode_jpeg(&raw, sampler.quality()).unwrap();
        let frame = sampler.commit(raw.width, raw.height, payload);
        assert_eq!(frame.sequence, 1);
        assert_eq!(counters.snapshot().frames_sampled, 1);
    }

    #[test]
    fn test_stop_releases_camera() {
        let device = TestPatternDevice::new(8, 8);
        let (mut sampler, counters) = sampler_for(&device);
        assert_eq!(device.open_handles(), 1);

        sampler.stop();

        assert_eq!(device.open_handles(), 0);
        assert!(sampler.sample().unwrap().is_none());
        assert_eq!(counters.snapshot().frames_sampled, 0);
    }
}
