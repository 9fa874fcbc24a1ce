use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Service version plus the backends an analysis would use. `llm_key_configured`
/// is false when requests will go out without credentials.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "interview-digest-api",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.completion.model(),
        "pdf_backend": state.extractor.pdf_backend(),
        "llm_key_configured": state.config.llm_api_key.is_some(),
    }))
}
