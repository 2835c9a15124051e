//! Assistant proxy server
//!
//! Reads its configuration from the environment (and `.env`), see
//! [`AppConfig`]. `GEMINI_API_KEY` is required.

use dronex_relay::{AppConfig, AssistantServer};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Set GEMINI_API_KEY (and optionally PORT, ALLOWED_ORIGINS) in the environment or .env");
            std::process::exit(1);
        }
    };
    tracing::debug!(config = ?config, "Configuration loaded");

    let server = AssistantServer::new(config)?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
