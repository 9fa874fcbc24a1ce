//! Axum route handlers for report conversion.
//!
//! Both endpoints take the operator-edited markdown. A missing table is a
//! 422 the UI shows as a warning; the edited text stays on the client.

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::report::{markdown, xlsx, ReportError, ReportTable, XLSX_FILE_NAME, XLSX_MIME};

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub markdown: String,
}

/// POST /api/v1/reports/preview
///
/// Returns the table the download would contain.
pub async fn handle_preview(
    Json(request): Json<ConvertRequest>,
) -> Result<Json<ReportTable>, AppError> {
    let table = recognize(&request.markdown)?;
    Ok(Json(table))
}

/// POST /api/v1/reports/xlsx
///
/// Converts the first table to a workbook and returns it as an attachment.
pub async fn handle_download_xlsx(
    Json(request): Json<ConvertRequest>,
) -> Result<Response, AppError> {
    let table = recognize(&request.markdown)?;
    let bytes = xlsx::write_workbook(&table)?;

    info!(
        "Workbook generated: {} columns, {} rows, {} bytes",
        table.width(),
        table.rows.len(),
        bytes.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{XLSX_FILE_NAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn recognize(text: &str) -> Result<ReportTable, AppError> {
    markdown::parse_first_table(text).map_err(|e| {
        if matches!(e, ReportError::NoTableRecognized) {
            warn!("No table recognized in {} chars of edited text", text.len());
        }
        AppError::from(e)
    })
}
