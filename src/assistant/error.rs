use thiserror::Error;

/// Message shown whenever the assistant cannot answer
pub const ASSISTANT_UNAVAILABLE: &str =
    "The assistant is unavailable right now. Please try again, or contact emergency services directly.";

/// Assistant and places lookup failures
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("upstream returned {status}")]
    Upstream {
        status: u16,
        body: serde_json::Value,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl AssistantError {
    pub fn user_message(&self) -> &'static str {
        ASSISTANT_UNAVAILABLE
    }

    /// Detail payload for the route's error body
    pub fn details(&self) -> serde_json::Value {
        match self {
            AssistantError::Upstream { body, .. } => body.clone(),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}
