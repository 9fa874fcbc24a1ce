//! Axum route handler for starting an analysis.

use anyhow::anyhow;
use axum::{
    extract::{Multipart, State},
    Json,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::analysis::session::{run_analysis, AnalysisInputs, AnalysisOutcome};
use crate::errors::AppError;
use crate::extraction::UploadedDocument;
use crate::state::AppState;

/// POST /api/v1/analyses
///
/// multipart/form-data with fields `goal` (text), `transcript` (file), `outline` (file).
/// Blocks until the completion arrives. If the client goes away first, the
/// analysis task is cancelled.
pub async fn handle_create_analysis(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisOutcome>, AppError> {
    let inputs = read_inputs(multipart).await?;

    let cancel = CancellationToken::new();
    // Dropped together with this future on client disconnect.
    let _cancel_on_drop = cancel.clone().drop_guard();

    let task = tokio::spawn(run_analysis(
        state.extractor.clone(),
        state.completion.clone(),
        inputs,
        cancel,
    ));

    let outcome = task
        .await
        .map_err(|e| AppError::Internal(anyhow!("analysis task failed: {e}")))??;

    Ok(Json(outcome))
}

async fn read_inputs(mut multipart: Multipart) -> Result<AnalysisInputs, AppError> {
    let mut goal: Option<String> = None;
    let mut transcript: Option<UploadedDocument> = None;
    let mut outline: Option<UploadedDocument> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "goal" => goal = Some(field.text().await?),
            "transcript" | "outline" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await?;
                // Browsers send an empty part when no file was picked.
                if file_name.is_empty() && content.is_empty() {
                    continue;
                }
                let document = UploadedDocument::new(file_name, content);
                if name == "transcript" {
                    transcript = Some(document);
                } else {
                    outline = Some(document);
                }
            }
            other => debug!("Ignoring unknown multipart field '{other}'"),
        }
    }

    let goal = goal
        .filter(|g| !g.trim().is_empty())
        .ok_or_else(|| AppError::Validation("goal is required".to_string()))?;
    let transcript = transcript
        .ok_or_else(|| AppError::Validation("transcript file is required".to_string()))?;
    let outline =
        outline.ok_or_else(|| AppError::Validation("outline file is required".to_string()))?;

    Ok(AnalysisInputs {
        goal,
        transcript,
        outline,
    })
}
