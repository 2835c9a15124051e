//! JPEG encoding of raw camera frames

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use thiserror::Error;

use crate::capture::RawFrame;

/// Frame encoding failure
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel buffer does not match the declared dimensions
    #[error("pixel buffer is {actual} bytes, expected {expected}")]
    InvalidBuffer { expected: usize, actual: usize },

    /// Zero-sized frame
    #[error("frame has no pixels")]
    Empty,

    #[error("jpeg encode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Encode an RGBA frame as JPEG at `quality` (1..=100)
pub fn encode_jpeg(frame: &RawFrame, quality: u8) -> Result<Bytes, EncodeError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(EncodeError::Empty);
    }
    if frame.rgba.len() != frame.expected_len() {
        return Err(EncodeError::InvalidBuffer {
            expected: frame.expected_len(),
            actual: frame.rgba.len(),
        });
    }

    // JPEG has no alpha channel
    let rgb: Vec<u8> = frame
        .rgba
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut out = Vec::with_capacity(rgb.len() / 8);
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder.encode(&rgb, frame.width, frame.height, ColorType::Rgb8)?;

    Ok(Bytes::from(out))
}
