pub mod backend;
pub mod config;
pub mod draft;
pub mod error;
pub mod history;
pub mod loader;
pub mod pipeline;
pub mod run;
pub mod schema;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{BackendError, BillGenerator, BillLedger, Notifier};
pub use config::{ErrorBody, ErrorResponse, IngestConfig, MailSettings};
pub use draft::{BillRecord, DebtDraft, ProcessedBill};
pub use error::{ErrorEnvelope, ErrorKind, IngestError};
pub use history::{Pending, ResumeStrategy, filter_processed, resume_point};
pub use loader::{LoadError, RowError, load_drafts};
pub use pipeline::{bill_all, bill_draft};
pub use run::{Ingestion, RunReport, RunStage, ensure_csv_filename};
pub use validate::{FieldError, ValidationFailure, validate_row};
