use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractError;
use crate::llm_client::LlmError;
use crate::report::ReportError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant is recoverable from the operator's point of view: the session
/// keeps its inputs and edited text, and the request can be retried.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{document}: {source}")]
    Extraction {
        document: &'static str,
        #[source]
        source: ExtractError,
    },

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Analysis was cancelled")]
    Cancelled,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn extraction(document: &'static str, source: ExtractError) -> Self {
        AppError::Extraction { document, source }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Validation(format!("Malformed multipart body: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Extraction {
                source: ExtractError::Unsupported { .. },
                ..
            } => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FILE_TYPE"),
            AppError::Extraction { source, .. } => {
                tracing::warn!("Extraction failed: {source}");
                (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_ERROR")
            }
            AppError::Report(ReportError::NoTableRecognized) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_TABLE_RECOGNIZED")
            }
            AppError::Report(ReportError::Encode(msg)) => {
                tracing::error!("Workbook encoding error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "ENCODE_ERROR")
            }
            AppError::Llm(LlmError::Timeout { .. }) => {
                tracing::error!("LLM error: {self}");
                (StatusCode::GATEWAY_TIMEOUT, "LLM_TIMEOUT")
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (StatusCode::BAD_GATEWAY, "LLM_ERROR")
            }
            AppError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "CANCELLED"),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        // Internal details stay in the logs. Everything else goes to the
        // operator verbatim, including the endpoint's status and body.
        let message = match &self {
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
