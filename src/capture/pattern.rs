//! Synthetic camera
//!
//! Produces a moving colour gradient at a fixed native resolution. Used by
//! tests and the demo in place of real hardware, and able to simulate the
//! device failures a real camera reports.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::{CaptureConstraints, CaptureDevice, CaptureError, CaptureSource, RawFrame};

/// Failure a [`TestPatternDevice`] reports on open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFault {
    PermissionDenied,
    NotFound,
    DeviceBusy,
    Unsupported,
}

impl DeviceFault {
    fn to_error(self) -> CaptureError {
        match self {
            DeviceFault::PermissionDenied => CaptureError::PermissionDenied,
            DeviceFault::NotFound => CaptureError::NotFound,
            DeviceFault::DeviceBusy => CaptureError::DeviceBusy,
            DeviceFault::Unsupported => CaptureError::Unsupported,
        }
    }
}

/// Synthetic capture device
#[derive(Debug)]
pub struct TestPatternDevice {
    width: u32,
    height: u32,
    warmup: Duration,
    fault: Option<DeviceFault>,
    reject_sized: bool,
    read_limit: Option<u64>,
    open_attempts: AtomicU32,
    open_handles: Arc<AtomicUsize>,
}

impl TestPatternDevice {
    /// Device producing frames of `width` x `height`
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            warmup: Duration::ZERO,
            fault: None,
            reject_sized: false,
            read_limit: None,
            open_attempts: AtomicU32::new(0),
            open_handles: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sources report not-ready for `warmup` after opening
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Every open fails with `fault`
    pub fn with_fault(mut self, fault: DeviceFault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Opens requesting a size or rate fail as overconstrained
    pub fn reject_sized_constraints(mut self) -> Self {
        self.reject_sized = true;
        self
    }

    /// Sources deliver `frames` reads, then report the camera as closed
    pub fn lose_after(mut self, frames: u64) -> Self {
        self.read_limit = Some(frames);
        self
    }

    /// Number of `open` calls so far
    pub fn open_attempts(&self) -> u32 {
        self.open_attempts.load(Ordering::Relaxed)
    }

    /// Number of sources currently holding the device
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::Relaxed)
    }
}

impl CaptureDevice for TestPatternDevice {
    fn name(&self) -> &str {
        "test-pattern"
    }

    fn open(&self, constraints: &CaptureConstraints) -> Result<Box<dyn CaptureSource>, CaptureError> {
        self.open_attempts.fetch_add(1, Ordering::Relaxed);

        if let Some(fault) = self.fault {
            return Err(fault.to_error());
        }
        if self.reject_sized && !constraints.is_relaxed() {
            return Err(CaptureError::Overconstrained(format!(
                "{:?}x{:?}",
                constraints.ideal_width, constraints.ideal_height
            )));
        }

        self.open_handles.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(TestPatternSource {
            width: self.width,
            height: self.height,
            ready_at: Instant::now() + self.warmup,
            tick: 0,
            read_limit: self.read_limit,
            handle: Some(Arc::clone(&self.open_handles)),
        }))
    }
}

/// Live source handed out by [`TestPatternDevice`]
#[derive(Debug)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    ready_at: Instant,
    tick: u64,
    read_limit: Option<u64>,
    /// Shared open-handle counter, released exactly once
    handle: Option<Arc<AtomicUsize>>,
}

impl TestPatternSource {
    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.fetch_sub(1, Ordering::Relaxed);
            tracing::debug!(frames = self.tick, "Test pattern source released");
        }
    }
}

impl CaptureSource for TestPatternSource {
    fn is_ready(&self) -> bool {
        self.handle.is_some() && Instant::now() >= self.ready_at
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_frame(&mut self) -> Result<RawFrame, CaptureError> {
        if self.handle.is_none() || self.read_limit.is_some_and(|limit| self.tick >= limit) {
            return Err(CaptureError::Closed);
        }

        let shift = ((self.tick * 8) % 256) as u32;
        let mut rgba = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                rgba.push(((x * 255 / self.width + shift) % 256) as u8);
                rgba.push(((y * 255 / self.height) % 256) as u8);
                rgba.push((shift % 256) as u8);
                rgba.push(0xFF);
            }
        }
        self.tick += 1;

        Ok(RawFrame {
            width: self.width,
            height: self.height,
            rgba,
        })
    }

    fn stop(&mut self) {
        self.release();
    }
}

impl Drop for TestPatternSource {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_dimensions() {
        let device = TestPatternDevice::new(16, 8);
        let mut source = device.open(&CaptureConstraints::relaxed()).unwrap();

        assert!(source.is_ready());
        let frame = source.read_frame().unwrap();
        assert_eq!(frame.width, 16);
        assert_eq!(frame.height, 8);
        assert_eq!(frame.rgba.len(), frame.expected_len());
    }

    #[test]
    fn test_handles_released_on_stop_and_drop() {
        let device = TestPatternDevice::new(4, 4);

        let mut a = device.open(&CaptureConstraints::relaxed()).unwrap();
        let b = device.open(&CaptureConstraints::relaxed()).unwrap();
        assert_eq!(device.open_handles(), 2);

        a.stop();
        assert_eq!(device.open_handles(), 1);
        assert!(matches!(a.read_frame(), Err(CaptureError::Closed)));
        assert!(!a.is_ready());

        drop(a);
        assert_eq!(device.open_handles(), 1);

        drop(b);
        assert_eq!(device.open_handles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_warmup_delays_readiness() {
        let device = TestPatternDevice::new(4, 4).with_warmup(Duration::from_millis(500));
        let source = device.open(&CaptureConstraints::relaxed()).unwrap();

        assert!(!source.is_ready());
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(source.is_ready());
    }

    #[test]
    fn test_lost_after_reads() {
        let device = TestPatternDevice::new(4, 4).lose_after(2);
        let mut source = device.open(&CaptureConstraints::relaxed()).unwrap();

        assert!(source.read_frame().is_ok());
        assert!(source.read_frame().is_ok());
        assert!(matches!(source.read_frame(), Err(CaptureError::Closed)));
        // Still holding the device until stopped
        assert_eq!(device.open_handles(), 1);
    }

    #[test]
    fn test_faults() {
        let device = TestPatternDevice::new(4, 4).with_fault(DeviceFault::DeviceBusy);
        assert!(matches!(
            device.open(&CaptureConstraints::relaxed()),
            Err(CaptureError::DeviceBusy)
        ));
        assert_eq!(device.open_handles(), 0);
    }
}
