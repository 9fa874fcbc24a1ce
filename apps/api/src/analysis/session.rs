//! Analysis session: orchestrates one run of the pipeline.
//!
//! Flow: validate inputs → extract transcript and outline (blocking pool, in
//! parallel) → build prompt → completion call (cancellable) → outcome.
//!
//! The outcome's `result_markdown` is what the operator reviews and edits
//! before asking for a workbook; conversion is a separate request.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::prompts::build_analysis_prompt;
use crate::errors::AppError;
use crate::extraction::{extract_blocking, DocumentKind, TextExtractor, UploadedDocument};
use crate::llm_client::CompletionBackend;
use crate::report::markdown::parse_first_table;

/// Raw inputs of one analysis, as collected from the operator.
#[derive(Debug, Clone)]
pub struct AnalysisInputs {
    pub goal: String,
    pub transcript: UploadedDocument,
    pub outline: UploadedDocument,
}

/// Validated, extracted inputs. All three fields are non-blank.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub goal: String,
    pub outline: String,
    pub transcript: String,
}

impl AnalysisRequest {
    pub fn new(goal: String, outline: String, transcript: String) -> Result<Self, AppError> {
        for (field, value) in [("goal", &goal), ("outline", &outline), ("transcript", &transcript)] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "{field} is empty; no text could be used from it"
                )));
            }
        }
        Ok(Self {
            goal,
            outline,
            transcript,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub analysis_id: Uuid,
    /// Model output, shown to the operator as editable text.
    pub result_markdown: String,
    /// Whether `result_markdown` already contains a recognizable table.
    pub table_detected: bool,
    pub model: String,
    pub transcript_kind: DocumentKind,
    pub outline_kind: DocumentKind,
    pub prompt_chars: usize,
    pub elapsed_ms: u128,
    pub completed_at: DateTime<Utc>,
}

/// Runs the full analysis pipeline.
///
/// `cancel` is tied to the operator's request: once it fires, the in-flight
/// completion call is dropped and `AppError::Cancelled` is returned.
pub async fn run_analysis(
    extractor: Arc<TextExtractor>,
    completion: Arc<dyn CompletionBackend>,
    inputs: AnalysisInputs,
    cancel: CancellationToken,
) -> Result<AnalysisOutcome, AppError> {
    let analysis_id = Uuid::new_v4();
    let started = Instant::now();

    let AnalysisInputs {
        goal,
        transcript,
        outline,
    } = inputs;

    if goal.trim().is_empty() {
        return Err(AppError::Validation("goal is required".to_string()));
    }

    let transcript_kind = transcript.kind();
    let outline_kind = outline.kind();
    info!(
        "Analysis {analysis_id}: transcript '{}' ({:?}, {} bytes), outline '{}' ({:?}, {} bytes)",
        transcript.name,
        transcript_kind,
        transcript.content.len(),
        outline.name,
        outline_kind,
        outline.content.len(),
    );

    // Step 1: Extract both documents
    let (transcript_text, outline_text) = tokio::try_join!(
        async {
            extract_blocking(extractor.clone(), transcript)
                .await
                .map_err(|e| AppError::extraction("transcript", e))
        },
        async {
            extract_blocking(extractor.clone(), outline)
                .await
                .map_err(|e| AppError::extraction("outline", e))
        },
    )?;

    let request = AnalysisRequest::new(goal, outline_text, transcript_text)?;
    info!(
        "Analysis {analysis_id}: extracted transcript={} chars, outline={} chars",
        request.transcript.chars().count(),
        request.outline.chars().count()
    );

    // Step 2: Build prompt
    let prompt = build_analysis_prompt(&request.transcript, &request.outline, &request.goal);

    // Step 3: Completion, abandoned if the session goes away
    let result_markdown = tokio::select! {
        _ = cancel.cancelled() => {
            warn!("Analysis {analysis_id}: cancelled while waiting for completion");
            return Err(AppError::Cancelled);
        }
        result = completion.complete(&prompt) => result?,
    };

    let table_detected = parse_first_table(&result_markdown).is_ok();
    if !table_detected {
        warn!("Analysis {analysis_id}: completion contains no recognizable table");
    }

    let elapsed_ms = started.elapsed().as_millis();
    info!("Analysis {analysis_id}: completed in {elapsed_ms}ms (table_detected={table_detected})");

    Ok(AnalysisOutcome {
        analysis_id,
        result_markdown,
        table_detected,
        model: completion.model().to_string(),
        transcript_kind,
        outline_kind,
        prompt_chars: prompt.chars().count(),
        elapsed_ms,
        completed_at: Utc::now(),
    })
}
