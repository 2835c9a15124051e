//! HTTP routes

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::assistant::{build_prompt, AssistantReply, AssistantRequest, ErrorBody, TextGenerator};

/// Shared state handed to every request
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
}

/// Mount the API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").route("/gemini-assistant", web::post().to(gemini_assistant)));
}

/// `POST /api/gemini-assistant`
pub async fn gemini_assistant(
    state: web::Data<AppState>,
    body: web::Json<AssistantRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    tracing::info!(
        input_len = request.input.len(),
        has_location = request.user_location.is_some(),
        safe_places = request.safe_places.as_ref().map_or(0, Vec::len),
        "Assistant request"
    );

    let prompt = build_prompt(&request);
    match state.generator.generate(&prompt).await {
        Ok(reply) => {
            tracing::debug!(reply_len = reply.len(), generator = state.generator.name(), "Assistant reply");
            HttpResponse::Ok().json(AssistantReply { reply })
        }
        Err(e) => {
            tracing::error!(error = %e, generator = state.generator.name(), "Assistant upstream failed");
            HttpResponse::InternalServerError().json(ErrorBody {
                error: "Gemini API error".to_string(),
                details: e.details(),
            })
        }
    }
}
