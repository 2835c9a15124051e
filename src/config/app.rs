//! Assistant server configuration loaded from the environment

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

/// Default upstream model endpoint
pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:8080".to_string(),
        "http://10.16.61.204:8080".to_string(),
    ]
}

fn default_gemini_api_url() -> String {
    DEFAULT_GEMINI_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Settings for the `dronex-relay` binary
///
/// Every field maps to the upper-cased environment variable of the same
/// name (`PORT`, `ALLOWED_ORIGINS`, `GEMINI_API_KEY`, ...). `ALLOWED_ORIGINS`
/// is a comma separated list.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    pub gemini_api_key: String,

    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Load from `.env` (if present) and the process environment
    pub fn from_env() -> Result<Self, envy::Error> {
        let _ = dotenvy::dotenv();
        envy::from_env::<AppConfig>()
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Timeout for upstream model calls
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_api_url", &self.gemini_api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
