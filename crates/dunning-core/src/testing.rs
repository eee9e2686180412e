//! In-memory ledger and scripted backends for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::backend::{BackendError, BillGenerator, BillLedger, Notifier};
use crate::draft::{BillRecord, DebtDraft};

pub fn draft(id: &str, due: &str) -> DebtDraft {
    DebtDraft {
        id: id.to_string(),
        name: format!("Debtor {id}"),
        government_id: "1234".into(),
        email: format!("{id}@example.com"),
        amount: Decimal::new(100, 0),
        due_date: NaiveDate::parse_from_str(due, "%Y-%m-%d").unwrap(),
    }
}

#[derive(Debug, Error)]
#[error("memory ledger: {0}")]
pub struct MemoryLedgerError(&'static str);

#[derive(Debug, Default)]
pub struct MemoryLedger {
    pub bills: Vec<BillRecord>,
    pub inserts: usize,
    reversed: bool,
    fail_lookup: bool,
    fail_insert: bool,
}

impl MemoryLedger {
    pub fn with_ids(ids: &[&str]) -> Self {
        Self {
            bills: ids
                .iter()
                .map(|id| BillRecord {
                    reference_id: id.to_string(),
                    bill_url: format!("https://bills.test/{id}"),
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Report existing ids newest-first.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    pub fn failing_lookup(mut self) -> Self {
        self.fail_lookup = true;
        self
    }

    pub fn failing_insert(mut self) -> Self {
        self.fail_insert = true;
        self
    }

    pub fn reference_ids(&self) -> Vec<&str> {
        self.bills.iter().map(|b| b.reference_id.as_str()).collect()
    }
}

impl BillLedger for MemoryLedger {
    type Error = MemoryLedgerError;

    fn find_existing(&self, reference_ids: &[String]) -> Result<Vec<String>, Self::Error> {
        if self.fail_lookup {
            return Err(MemoryLedgerError("lookup refused"));
        }
        let mut found: Vec<String> = self
            .bills
            .iter()
            .filter(|b| reference_ids.contains(&b.reference_id))
            .map(|b| b.reference_id.clone())
            .collect();
        if self.reversed {
            found.reverse();
        }
        Ok(found)
    }

    fn insert_all(&mut self, bills: &[BillRecord]) -> Result<(), Self::Error> {
        if self.fail_insert {
            return Err(MemoryLedgerError("insert refused"));
        }
        self.inserts += 1;
        self.bills.extend_from_slice(bills);
        Ok(())
    }
}

/// Returns `https://bills.test/<name>`; fails for one debtor name if asked to.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    pub fail_for: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl BillGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        name: &str,
        _amount: Decimal,
        _due_date: NaiveDate,
    ) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push(name.to_string());
        if self.fail_for.as_deref() == Some(name) {
            return Err(format!("cannot render bill for {name}").into());
        }
        Ok(format!("https://bills.test/{}", name.replace(' ', "-")))
    }
}

/// Records `(receiver, bill_url)` pairs; fails for one receiver if asked to.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub fail_for: Option<String>,
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, receiver: &str, bill_url: &str) -> Result<(), BackendError> {
        if self.fail_for.as_deref() == Some(receiver) {
            return Err(format!("mailbox {receiver} unavailable").into());
        }
        self.sent
            .lock()
            .unwrap()
            .push((receiver.to_string(), bill_url.to_string()));
        Ok(())
    }
}
