//! Report conversion: recover the report table from (operator-edited) model
//! output and serialize it as a single-sheet workbook.
//!
//! Policy: only the first recognized table (pipe or HTML) is used. Later
//! tables are ignored.

pub mod handlers;
pub mod html;
pub mod markdown;
pub mod xlsx;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const XLSX_FILE_NAME: &str = "interview_analysis.xlsx";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no table recognized; check that the text contains a markdown table with a header row and a separator row")]
    NoTableRecognized,

    #[error("failed to encode workbook: {0}")]
    Encode(String),
}

/// Tabular data recovered from model output. Every row has exactly
/// `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn width(&self) -> usize {
        self.headers.len()
    }
}
