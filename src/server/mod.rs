//! Assistant HTTP server
//!
//! One route, `POST /api/gemini-assistant`, behind a CORS allow-list that
//! accepts credentials from the configured origins only.

pub mod routes;

pub use routes::{configure, gemini_assistant, AppState};

use std::future::Future;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{middleware, web, App, HttpServer};

use crate::assistant::{GeminiClient, TextGenerator};
use crate::config::AppConfig;
use crate::error::{Error, Result};

/// CORS policy for the configured origins
pub fn cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default();
    for origin in origins {
        cors = cors.allowed_origin(origin);
    }

    cors.allowed_methods(vec!["POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .supports_credentials()
        .max_age(3600)
}

/// The assistant server
pub struct AssistantServer {
    config: AppConfig,
    generator: Arc<dyn TextGenerator>,
}

impl AssistantServer {
    /// Server backed by the Gemini endpoint in `config`
    pub fn new(config: AppConfig) -> Result<Self> {
        let generator = GeminiClient::new(
            config.gemini_api_url.clone(),
            config.gemini_api_key.clone(),
            config.request_timeout(),
        )?;

        Ok(Self::with_generator(config, Arc::new(generator)))
    }

    /// Server backed by any text generator
    pub fn with_generator(config: AppConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self { config, generator }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn build(&self) -> Result<actix_web::dev::Server> {
        let addr = self
            .config
            .bind_addr()
            .map_err(|e| Error::Config(format!("invalid bind address: {}", e)))?;
        let state = web::Data::new(AppState {
            generator: Arc::clone(&self.generator),
        });
        let origins = self.config.allowed_origins.clone();

        let server = HttpServer::new(move || {
            App::new()
                .wrap(middleware::Logger::default())
                .wrap(cors(&origins))
                .app_data(state.clone())
                .configure(configure)
        })
        .bind(addr)?
        .run();

        tracing::info!(
            addr = %addr,
            origins = ?self.config.allowed_origins,
            generator = self.generator.name(),
            "Assistant server listening"
        );
        Ok(server)
    }

    /// Run until the process is stopped
    pub async fn run(&self) -> Result<()> {
        self.build()?.await?;
        Ok(())
    }

    /// Run until `shutdown` resolves, then stop gracefully
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let server = self.build()?;
        let handle = server.handle();

        tokio::select! {
            result = server => result?,
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                handle.stop(true).await;
            }
        }

        Ok(())
    }
}
