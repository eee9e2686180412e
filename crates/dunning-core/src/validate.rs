//! Row-level schema validation for uploaded debt batches.
//!
//! A row is a mapping of column name to raw string value. Validation never
//! stops at the first problem: every missing or malformed field is reported
//! so a caller can fix a whole row in one pass.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::draft::DebtDraft;
use crate::schema::upload;

/// One column of a raw CSV row, keyed by header name.
pub type RawRow<'a> = HashMap<&'a str, &'a str>;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// All field errors found in one row.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{} invalid field(s)", .errors.len())]
pub struct ValidationFailure {
    pub errors: Vec<FieldError>,
}

/// Validate one raw row into a [`DebtDraft`].
///
/// Unknown columns are ignored. Values are taken verbatim; the only coercion
/// is parsing `debtAmount` as a decimal and `debtDueDate` as `YYYY-MM-DD`.
pub fn validate_row(row: &RawRow<'_>) -> Result<DebtDraft, ValidationFailure> {
    let mut errors = Vec::new();

    let id = required(row, upload::DEBT_ID, &mut errors)
        .and_then(|v| non_empty(upload::DEBT_ID, v, &mut errors));
    let name = required(row, upload::NAME, &mut errors)
        .and_then(|v| non_empty(upload::NAME, v, &mut errors));
    let government_id = required(row, upload::GOVERNMENT_ID, &mut errors).map(str::to_string);
    let email = required(row, upload::EMAIL, &mut errors).and_then(|v| {
        if looks_like_email(v) {
            Some(v.to_string())
        } else {
            errors.push(FieldError::new(upload::EMAIL, "not a valid email address"));
            None
        }
    });
    let amount = required(row, upload::DEBT_AMOUNT, &mut errors).and_then(|v| {
        parse_amount(v)
            .map_err(|reason| errors.push(FieldError::new(upload::DEBT_AMOUNT, reason)))
            .ok()
    });
    let due_date = required(row, upload::DEBT_DUE_DATE, &mut errors).and_then(|v| {
        parse_due_date(v)
            .map_err(|reason| errors.push(FieldError::new(upload::DEBT_DUE_DATE, reason)))
            .ok()
    });

    match (id, name, government_id, email, amount, due_date) {
        (Some(id), Some(name), Some(government_id), Some(email), Some(amount), Some(due_date))
            if errors.is_empty() =>
        {
            Ok(DebtDraft {
                id,
                name,
                government_id,
                email,
                amount,
                due_date,
            })
        }
        _ => Err(ValidationFailure { errors }),
    }
}

fn required<'a>(row: &RawRow<'a>, field: &str, errors: &mut Vec<FieldError>) -> Option<&'a str> {
    let value = row.get(field).copied();
    if value.is_none() {
        errors.push(FieldError::new(field, "field required"));
    }
    value
}

fn non_empty(field: &str, value: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    if value.is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
        return None;
    }
    Some(value.to_string())
}

/// Structural check only: one `@`, a non-empty local part, a dotted domain,
/// no whitespace.
fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

fn parse_amount(value: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(value)
        .map_err(|_| format!("{value:?} is not a valid decimal number"))?;
    if amount <= Decimal::ZERO {
        return Err(format!("amount must be greater than zero, got {amount}"));
    }
    Ok(amount)
}

fn parse_due_date(value: &str) -> Result<NaiveDate, String> {
    // chrono accepts signs, spaces and unpadded fields; pin the ISO shape first.
    if !is_iso_date_shape(value) {
        return Err(format!("{value:?} is not a date in YYYY-MM-DD format"));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("{value:?} is not a valid calendar date: {e}"))
}

fn is_iso_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
