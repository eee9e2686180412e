//! Built-in backends used when no remote service is configured.

use async_trait::async_trait;
use chrono::NaiveDate;
use dunning_core::{BackendError, BillGenerator, MailSettings, Notifier};
use rust_decimal::Decimal;
use tracing::debug;

pub const DEFAULT_BILL_URL: &str = "https://valid.file.url";

/// Returns the same bill location for every debt.
#[derive(Debug, Clone)]
pub struct StaticBillGenerator {
    url: String,
}

impl Default for StaticBillGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_BILL_URL)
    }
}

impl StaticBillGenerator {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl BillGenerator for StaticBillGenerator {
    async fn generate(
        &self,
        name: &str,
        amount: Decimal,
        due_date: NaiveDate,
    ) -> Result<String, BackendError> {
        debug!(name, %amount, %due_date, url = %self.url, "static bill issued");
        Ok(self.url.clone())
    }
}

/// Accepts every message without delivering it.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier {
    mail: MailSettings,
}

impl NoopNotifier {
    pub fn new(mail: MailSettings) -> Self {
        Self { mail }
    }
}

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, receiver: &str, bill_url: &str) -> Result<(), BackendError> {
        debug!(
            sender = %self.mail.sender,
            receiver,
            subject = %self.mail.subject,
            attachment = bill_url,
            "mail delivery skipped"
        );
        Ok(())
    }
}
