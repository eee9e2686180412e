use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendError;
use crate::loader::LoadError;

/// Closed set of failure kinds surfaced to the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidFile,
    FileValidation,
    BillGeneration,
    SendEmail,
    StoreBills,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::InvalidFile,
        ErrorKind::FileValidation,
        ErrorKind::BillGeneration,
        ErrorKind::SendEmail,
        ErrorKind::StoreBills,
    ];

    /// Stable wire code.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidFile => "E001",
            ErrorKind::FileValidation => "E002",
            ErrorKind::BillGeneration => "E003",
            ErrorKind::SendEmail => "E004",
            ErrorKind::StoreBills => "E005",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidFile => "INVALID_FILE",
            ErrorKind::FileValidation => "FILE_VALIDATION",
            ErrorKind::BillGeneration => "BILL_GENERATION",
            ErrorKind::SendEmail => "SEND_EMAIL",
            ErrorKind::StoreBills => "STORE_BILLS",
        }
    }

    /// Client errors are the uploader's to fix; the rest are ours.
    pub fn is_client_error(self) -> bool {
        matches!(self, ErrorKind::InvalidFile | ErrorKind::FileValidation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed run as seen from outside: the kind plus an optional diagnostic.
///
/// `detail` is raw diagnostic payload; the boundary decides what to expose.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{kind} ({})", .kind.code())]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub detail: Option<serde_json::Value>,
}

/// Stage failures inside one ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file name {0:?} does not end in .csv")]
    InvalidFile(String),

    #[error("file validation failed: {0}")]
    FileValidation(#[from] LoadError),

    #[error("bill generation failed for debt {debt_id}: {source}")]
    BillGeneration {
        debt_id: String,
        #[source]
        source: BackendError,
    },

    #[error("sending bill for debt {debt_id} failed: {source}")]
    SendEmail {
        debt_id: String,
        #[source]
        source: BackendError,
    },

    #[error("bill history lookup failed: {0}")]
    HistoryLookup(#[source] BackendError),

    #[error("storing bills failed: {0}")]
    StoreBills(#[source] BackendError),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::InvalidFile(_) => ErrorKind::InvalidFile,
            IngestError::FileValidation(_) => ErrorKind::FileValidation,
            IngestError::BillGeneration { .. } => ErrorKind::BillGeneration,
            IngestError::SendEmail { .. } => ErrorKind::SendEmail,
            IngestError::HistoryLookup(_) | IngestError::StoreBills(_) => ErrorKind::StoreBills,
        }
    }

    /// Translate into the outward envelope. Storage causes are dropped.
    pub fn envelope(&self) -> ErrorEnvelope {
        let detail = match self {
            IngestError::InvalidFile(_) => None,
            IngestError::FileValidation(err) => Some(err.detail()),
            IngestError::BillGeneration { source, .. } | IngestError::SendEmail { source, .. } => {
                Some(serde_json::Value::String(source.to_string()))
            }
            IngestError::HistoryLookup(_) | IngestError::StoreBills(_) => None,
        };
        ErrorEnvelope {
            kind: self.kind(),
            detail,
        }
    }
}
