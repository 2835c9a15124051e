//! Client for the assistant route

use std::time::Duration;

use reqwest::Client as HttpClient;

use super::error::{AssistantError, ASSISTANT_UNAVAILABLE};
use super::types::{AssistantReply, AssistantRequest};

/// Calls `POST /api/gemini-assistant` on a running server
pub struct AssistantClient {
    client: HttpClient,
    endpoint: String,
}

impl AssistantClient {
    /// `base_url` is the server root, e.g. `http://localhost:4000`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AssistantError> {
        let client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/gemini-assistant", base_url.trim_end_matches('/')),
        })
    }

    /// Ask the assistant
    pub async fn ask(&self, request: &AssistantRequest) -> Result<String, AssistantError> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json().await.unwrap_or(serde_json::Value::Null);
            return Err(AssistantError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let reply: AssistantReply = response
            .json()
            .await
            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;
        Ok(reply.reply)
    }

    /// Ask the assistant, replacing any failure with the unavailable message
    pub async fn ask_or_unavailable(&self, request: &AssistantRequest) -> String {
        match self.ask(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Assistant request failed");
                ASSISTANT_UNAVAILABLE.to_string()
            }
        }
    }
}
