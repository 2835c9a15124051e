//! Text generation backends

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Serialize;

use super::error::AssistantError;

/// Something that turns a prompt into a reply
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    client: HttpClient,
    api_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Pull the first candidate's text out of a response body
    ///
    /// A well-formed response without text yields an empty reply.
    pub fn extract_reply(body: &serde_json::Value) -> String {
        body.pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: serde_json::Value =
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

        if !status.is_success() {
            return Err(AssistantError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Self::extract_reply(&body))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
