//! Crate error type
//!
//! Failures fall into four groups, each handled differently by callers:
//! - transient service I/O: logged and swallowed, leaving a gap
//! - permission failures: surfaced to the user
//! - media-device failures: surfaced with a device-specific message
//! - subscription failures: reported through the viewer's connection state

use thiserror::Error;

use crate::assistant::AssistantError;
use crate::backend::BackendError;
use crate::broadcast::EncodeError;
use crate::capture::CaptureError;

/// Generic message shown when the service misbehaves
pub const SERVICE_UNAVAILABLE: &str = "Service unavailable. Please try again.";

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("assistant error: {0}")]
    Assistant(#[from] AssistantError),

    /// The caller's admin flag does not allow the operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Message suitable for a toast or alert
    pub fn user_message(&self) -> String {
        match self {
            Error::Capture(e) => e.user_message(),
            Error::PermissionDenied(msg) => format!("Permission denied: {}", msg),
            Error::Backend(BackendError::PermissionDenied(msg)) => {
                format!("Permission denied: {}", msg)
            }
            Error::Backend(BackendError::StreamNotFound(_)) => "Stream no longer exists.".into(),
            Error::Backend(BackendError::StreamNotActive(_)) => "Stream has ended.".into(),
            Error::Assistant(e) => e.user_message().to_string(),
            _ => SERVICE_UNAVAILABLE.into(),
        }
    }

    /// Whether the error is transient I/O that callers may swallow
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Backend(e) => e.is_transient(),
            Error::Encode(_) => true,
            _ => false,
        }
    }
}

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
