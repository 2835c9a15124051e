//! Configuration
//!
//! - [`RelayConfig`]: pipeline cadence and buffer sizing, built in code
//! - [`AppConfig`]: the assistant server, loaded from the environment

pub mod app;
pub mod relay;

pub use app::{AppConfig, DEFAULT_GEMINI_API_URL};
pub use relay::{RelayConfig, MIN_INTERVAL};
