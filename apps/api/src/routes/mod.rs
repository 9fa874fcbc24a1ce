pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::report::handlers as report;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyses", post(analysis::handle_create_analysis))
        .route("/api/v1/reports/preview", post(report::handle_preview))
        .route("/api/v1/reports/xlsx", post(report::handle_download_xlsx))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
