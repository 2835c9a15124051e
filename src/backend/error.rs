//! Realtime service error types

use thiserror::Error;

use crate::model::StreamId;

/// Error type for realtime service operations
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Stream row not found
    #[error("Stream not found: {0}")]
    StreamNotFound(StreamId),

    /// Stream exists but has been deactivated
    #[error("Stream not active: {0}")]
    StreamNotActive(StreamId),

    /// Rejected by the service's access rules
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Network or service failure
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Whether the failure is transient I/O that callers log and swallow
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_transient() {
        let id = StreamId::new();
        let all = [
            BackendError::StreamNotFound(id),
            BackendError::StreamNotActive(id),
            BackendError::PermissionDenied("rls".into()),
            BackendError::Unavailable("timeout".into()),
        ];

        for err in &all {
            let expected = match err {
                BackendError::Unavailable(_) => true,
                BackendError::StreamNotFound(_)
                | BackendError::StreamNotActive(_)
                | BackendError::PermissionDenied(_) => false,
            };
            assert_eq!(err.is_transient(), expected, "{}", err);
        }
    }
}
