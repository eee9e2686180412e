//! Capabilities the ingestion pipeline consumes.
//!
//! - [`BillLedger`]: the durable table of bills already issued
//! - [`BillGenerator`]: renders a bill and returns where it can be fetched
//! - [`Notifier`]: delivers a bill location to the debtor

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::draft::BillRecord;

/// Error type for generation and notification backends.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Persistence for processed bills, keyed by reference id.
///
/// Synchronous like the store layer; one instance is held for exactly one run.
pub trait BillLedger {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Return the subset of `reference_ids` already stored, in ledger order.
    fn find_existing(&self, reference_ids: &[String]) -> Result<Vec<String>, Self::Error>;

    /// Insert every bill in a single transaction. Nothing is stored on failure.
    fn insert_all(&mut self, bills: &[BillRecord]) -> Result<(), Self::Error>;
}

#[async_trait]
pub trait BillGenerator: Send + Sync {
    /// Produce a bill and return its location.
    async fn generate(
        &self,
        name: &str,
        amount: Decimal,
        due_date: NaiveDate,
    ) -> Result<String, BackendError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send the bill at `bill_url` to `receiver`.
    async fn send(&self, receiver: &str, bill_url: &str) -> Result<(), BackendError>;
}
