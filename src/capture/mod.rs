//! Camera capture sources
//!
//! A [`CaptureDevice`] hands out a live [`CaptureSource`] for a set of
//! constraints. The broadcaster owns the source for the whole broadcast and
//! drops it on every exit path, which releases the device.
//!
//! Device failures map to a small set of user-facing messages. A device
//! that rejects the requested constraints is retried exactly once with
//! relaxed constraints (see [`open_with_fallback`]).

pub mod pattern;

pub use pattern::{DeviceFault, TestPatternDevice, TestPatternSource};

use thiserror::Error;

use crate::model::StreamQuality;

/// Constraints requested when opening a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureConstraints {
    /// Ideal frame width in pixels (None = device default)
    pub ideal_width: Option<u32>,
    /// Ideal frame height in pixels (None = device default)
    pub ideal_height: Option<u32>,
    /// Ideal frame rate (None = device default)
    pub frame_rate: Option<u32>,
}

impl CaptureConstraints {
    /// Constraints matching a declared quality tier
    pub fn for_quality(quality: StreamQuality) -> Self {
        let (width, height) = quality.ideal_resolution();
        Self {
            ideal_width: Some(width),
            ideal_height: Some(height),
            frame_rate: Some(30),
        }
    }

    /// Relaxed constraints used for the single fallback attempt
    pub fn relaxed() -> Self {
        Self::default()
    }

    /// Whether any size or rate is requested
    pub fn is_relaxed(&self) -> bool {
        self.ideal_width.is_none() && self.ideal_height.is_none() && self.frame_rate.is_none()
    }
}

/// One raw camera frame, RGBA8, row-major
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data
    pub rgba: Vec<u8>,
}

impl RawFrame {
    /// Expected byte length for the frame's dimensions
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Media-device failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// User or OS refused camera access
    #[error("camera permission denied")]
    PermissionDenied,

    /// No capture device present
    #[error("no camera found")]
    NotFound,

    /// Device held by another application
    #[error("camera is busy")]
    DeviceBusy,

    /// Device cannot satisfy the requested constraints
    #[error("camera constraints not supported: {0}")]
    Overconstrained(String),

    /// Capture API unavailable on this platform
    #[error("camera capture not supported")]
    Unsupported,

    /// Source was stopped
    #[error("capture source closed")]
    Closed,

    /// Anything else the device reported
    #[error("capture failed: {0}")]
    Failed(String),
}

impl CaptureError {
    /// Message suitable for showing to the broadcaster
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::PermissionDenied => {
                "Camera permission denied. Please allow camera access in your settings.".into()
            }
            CaptureError::NotFound => "No camera found on this device.".into(),
            CaptureError::DeviceBusy => {
                "Camera is being used by another application. Please close it and try again."
                    .into()
            }
            CaptureError::Overconstrained(_) => {
                "Camera does not support the requested settings.".into()
            }
            CaptureError::Unsupported => "Camera capture is not supported on this device.".into(),
            CaptureError::Closed => "Camera stream has stopped.".into(),
            CaptureError::Failed(msg) => format!("Failed to access camera: {}", msg),
        }
    }
}

/// A live camera stream
pub trait CaptureSource: Send {
    /// Whether pixels can be read yet (false while the device warms up)
    fn is_ready(&self) -> bool;

    /// Native resolution of frames returned by [`read_frame`](Self::read_frame)
    fn resolution(&self) -> (u32, u32);

    /// Read the current frame at native resolution
    fn read_frame(&mut self) -> Result<RawFrame, CaptureError>;

    /// Release the device. Dropping the source must do the same.
    fn stop(&mut self);
}

/// Something that can open capture sources
pub trait CaptureDevice: Send + Sync {
    /// Human-readable device name
    fn name(&self) -> &str;

    /// Open a live source honouring `constraints`
    fn open(&self, constraints: &CaptureConstraints) -> Result<Box<dyn CaptureSource>, CaptureError>;
}

/// Open a device, retrying once with relaxed constraints on a constraint error
pub fn open_with_fallback(
    device: &dyn CaptureDevice,
    constraints: &CaptureConstraints,
) -> Result<Box<dyn CaptureSource>, CaptureError> {
    match device.open(constraints) {
        Err(CaptureError::Overconstrained(reason)) if !constraints.is_relaxed() => {
            tracing::warn!(
                device = device.name(),
                reason = %reason,
                "Capture constraints rejected, retrying with defaults"
            );
            device.open(&CaptureConstraints::relaxed())
        }
        other => other,
    }
}
