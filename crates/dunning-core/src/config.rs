//! Run configuration, built once by the caller and handed to each ingestion.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{ErrorEnvelope, ErrorKind};
use crate::history::ResumeStrategy;

/// Status code and user-facing message for one error kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSpec {
    pub status: u16,
    pub msg: String,
}

/// Outbound mail parameters passed to notification backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailSettings {
    pub subject: String,
    pub port: u16,
    pub sender: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            subject: "Boleto para pagamento.".into(),
            port: 465,
            sender: "email@mail.com".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    responses: HashMap<ErrorKind, ResponseSpec>,
    pub mail: MailSettings,
    pub resume: ResumeStrategy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let responses = ErrorKind::ALL
            .into_iter()
            .map(|kind| (kind, default_response(kind)))
            .collect();
        Self {
            responses,
            mail: MailSettings::default(),
            resume: ResumeStrategy::default(),
        }
    }
}

fn default_response(kind: ErrorKind) -> ResponseSpec {
    let (status, msg) = match kind {
        ErrorKind::InvalidFile => (400, "Invalid file."),
        ErrorKind::FileValidation => (400, "File data isn`t valid."),
        ErrorKind::BillGeneration => (500, "It was not possible to generate bill."),
        ErrorKind::SendEmail => (500, "It was not possible to send the email."),
        ErrorKind::StoreBills => (500, "It was not possible to store bills in database."),
    };
    ResponseSpec {
        status,
        msg: msg.to_string(),
    }
}

/// Body returned to the uploader on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub msg: String,
    pub reason: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub body: ErrorBody,
}

impl IngestConfig {
    pub fn with_mail(mut self, mail: MailSettings) -> Self {
        self.mail = mail;
        self
    }

    pub fn with_resume(mut self, resume: ResumeStrategy) -> Self {
        self.resume = resume;
        self
    }

    /// Override the status and message reported for `kind`.
    pub fn with_response(mut self, kind: ErrorKind, status: u16, msg: impl Into<String>) -> Self {
        self.responses.insert(
            kind,
            ResponseSpec {
                status,
                msg: msg.into(),
            },
        );
        self
    }

    pub fn response_for(&self, kind: ErrorKind) -> ResponseSpec {
        self.responses
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| default_response(kind))
    }

    /// Render a failed run for the transport boundary.
    pub fn respond(&self, envelope: &ErrorEnvelope) -> ErrorResponse {
        let spec = self.response_for(envelope.kind);
        ErrorResponse {
            status: spec.status,
            body: ErrorBody {
                msg: spec.msg,
                reason: envelope.detail.clone(),
            },
        }
    }
}
