//! Text Extractor: turns an uploaded PDF, DOCX or TXT document into plain text.
//!
//! Dispatch is by filename suffix (case-insensitive). Anything else is an
//! `ExtractError::Unsupported`; callers never see a sentinel string in place of text.

pub mod docx;
pub mod pdf;

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::extraction::pdf::PdfExtractor;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {name}")]
    Unsupported { name: String },

    #[error("'{name}' is not valid UTF-8 text")]
    InvalidUtf8 { name: String },

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction worker failed: {0}")]
    Join(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
    Other,
}

impl DocumentKind {
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.ends_with(".pdf") {
            DocumentKind::Pdf
        } else if lower.ends_with(".docx") {
            DocumentKind::Docx
        } else if lower.ends_with(".txt") {
            DocumentKind::Txt
        } else {
            DocumentKind::Other
        }
    }
}

/// A file as received from the operator's upload. Consumed once by the extractor.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub content: Bytes,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_file_name(&self.name)
    }
}

/// Dispatches a document to the backend for its kind.
///
/// All work is blocking; async callers go through [`extract_blocking`].
#[derive(Clone)]
pub struct TextExtractor {
    pdf: Arc<dyn PdfExtractor>,
}

impl TextExtractor {
    pub fn new(pdf: Arc<dyn PdfExtractor>) -> Self {
        Self { pdf }
    }

    pub fn pdf_backend(&self) -> &str {
        self.pdf.backend_name()
    }

    pub fn extract(&self, document: &UploadedDocument) -> Result<String, ExtractError> {
        match document.kind() {
            DocumentKind::Pdf => {
                let pages = self.pdf.extract_pages(&document.content)?;
                Ok(pdf::join_pages(&pages))
            }
            DocumentKind::Docx => docx::extract_docx(&document.content),
            DocumentKind::Txt => decode_text(&document.name, &document.content),
            DocumentKind::Other => Err(ExtractError::Unsupported {
                name: document.name.clone(),
            }),
        }
    }
}

/// Runs [`TextExtractor::extract`] on the blocking pool.
/// A panic inside a parsing library surfaces as `ExtractError::Join`.
pub async fn extract_blocking(
    extractor: Arc<TextExtractor>,
    document: UploadedDocument,
) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extractor.extract(&document))
        .await
        .map_err(|e| ExtractError::Join(e.to_string()))?
}

fn decode_text(name: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::InvalidUtf8 {
        name: name.to_string(),
    })
}
