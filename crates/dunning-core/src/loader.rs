//! Decodes an uploaded CSV batch into due-date-ordered drafts.

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::draft::DebtDraft;
use crate::validate::{FieldError, RawRow, validate_row};

/// Validation errors for one data row.
///
/// `row` is the record's line in the file minus the header line, so blank
/// lines the reader skips still count toward the number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("upload is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("{} row(s) failed validation", .0.len())]
    Rows(Vec<RowError>),
}

impl LoadError {
    /// Diagnostic payload reported back to the uploader.
    pub fn detail(&self) -> serde_json::Value {
        match self {
            LoadError::Rows(rows) => json!(rows),
            other => json!([{ "row": null, "errors": [{ "field": null, "reason": other.to_string() }] }]),
        }
    }
}

/// Parse and validate every row of `bytes`, then stable-sort by due date.
///
/// All row failures are collected before returning, so one call reports
/// every bad row of the batch. Drafts sharing a due date keep file order.
pub fn load_drafts(bytes: &[u8]) -> Result<Vec<DebtDraft>, LoadError> {
    let text = std::str::from_utf8(bytes)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut drafts = Vec::new();
    let mut failures = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row_number = record
            .position()
            .map_or(index + 1, |pos| pos.line().saturating_sub(1) as usize);
        let row: RawRow<'_> = headers.iter().zip(record.iter()).collect();
        match validate_row(&row) {
            Ok(draft) => drafts.push(draft),
            Err(failure) => failures.push(RowError {
                row: row_number,
                errors: failure.errors,
            }),
        }
    }

    if !failures.is_empty() {
        warn!(invalid_rows = failures.len(), "batch validation failed");
        return Err(LoadError::Rows(failures));
    }

    drafts.sort_by_key(|draft| draft.due_date);
    info!(count = drafts.len(), "batch validated");
    Ok(drafts)
}
