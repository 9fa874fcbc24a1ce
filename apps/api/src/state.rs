use std::sync::Arc;

use crate::config::Config;
use crate::extraction::TextExtractor;
use crate::llm_client::CompletionBackend;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only after startup; per-analysis data lives in the request.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<TextExtractor>,
    /// Pluggable completion backend. Default: `LlmClient` against the configured endpoint.
    pub completion: Arc<dyn CompletionBackend>,
    pub config: Config,
}
