//! HTTP clients for remote bill-rendering and mail-relay services.

use async_trait::async_trait;
use chrono::NaiveDate;
use dunning_core::{BackendError, BillGenerator, MailSettings, Notifier};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum BackendHttpError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct BillRequest<'a> {
    name: &'a str,
    amount: Decimal,
    due_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct BillResponse {
    url: String,
}

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    sender: &'a str,
    receiver: &'a str,
    subject: &'a str,
    port: u16,
    attachment: &'a str,
}

fn trim_base(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, BackendHttpError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(BackendHttpError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

/// Client for a bill-rendering service exposing `POST /bills`.
pub struct HttpBillGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBillGenerator {
    /// `base_url` should be like `http://localhost:4000` (a trailing slash is trimmed).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: trim_base(base_url),
        }
    }

    /// Request a bill and return its location.
    pub async fn request_bill(
        &self,
        name: &str,
        amount: Decimal,
        due_date: NaiveDate,
    ) -> Result<String, BackendHttpError> {
        let url = format!("{}/bills", self.base_url);
        debug!(url = %url, %due_date, "requesting bill");
        let body = BillRequest {
            name,
            amount,
            due_date,
        };
        let resp = check_status(self.client.post(&url).json(&body).send().await?).await?;
        let bill: BillResponse = resp.json().await?;
        Ok(bill.url)
    }
}

#[async_trait]
impl BillGenerator for HttpBillGenerator {
    async fn generate(
        &self,
        name: &str,
        amount: Decimal,
        due_date: NaiveDate,
    ) -> Result<String, BackendError> {
        Ok(self.request_bill(name, amount, due_date).await?)
    }
}

/// Client for a mail relay exposing `POST /messages`.
pub struct HttpMailer {
    client: reqwest::Client,
    base_url: String,
    mail: MailSettings,
}

impl HttpMailer {
    pub fn new(base_url: String, mail: MailSettings) -> Self {
        info!(sender = %mail.sender, port = mail.port, "mail relay configured");
        Self {
            client: reqwest::Client::new(),
            base_url: trim_base(base_url),
            mail,
        }
    }

    /// Send `bill_url` to `receiver` using the configured sender and subject.
    pub async fn deliver(&self, receiver: &str, bill_url: &str) -> Result<(), BackendHttpError> {
        let url = format!("{}/messages", self.base_url);
        debug!(url = %url, receiver, "sending bill");
        check_status(
            self.client
                .post(&url)
                .json(&self.message(receiver, bill_url))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    fn message<'a>(&'a self, receiver: &'a str, bill_url: &'a str) -> MailRequest<'a> {
        MailRequest {
            sender: &self.mail.sender,
            receiver,
            subject: &self.mail.subject,
            port: self.mail.port,
            attachment: bill_url,
        }
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send(&self, receiver: &str, bill_url: &str) -> Result<(), BackendError> {
        Ok(self.deliver(receiver, bill_url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bill_request_json_shape() {
        let req = BillRequest {
            name: "Elijah Santos",
            amount: Decimal::new(781150, 2),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 19).unwrap(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["name"], "Elijah Santos");
        assert_eq!(json["amount"], "7811.50");
        assert_eq!(json["due_date"], "2024-01-19");
    }

    #[test]
    fn bill_response_parses_url() {
        let parsed: BillResponse =
            serde_json::from_str(r#"{"url": "https://bills.example/42", "pages": 1}"#).unwrap();
        assert_eq!(parsed.url, "https://bills.example/42");
    }

    #[test]
    fn mail_request_uses_configured_settings() {
        let mailer = HttpMailer::new("http://relay:2525".into(), MailSettings::default());
        let json = serde_json::to_value(mailer.message("valid@email.com", "https://valid.url")).unwrap();
        assert_eq!(json["sender"], "email@mail.com");
        assert_eq!(json["subject"], "Boleto para pagamento.");
        assert_eq!(json["port"], 465);
        assert_eq!(json["receiver"], "valid@email.com");
        assert_eq!(json["attachment"], "https://valid.url");
    }

    #[test]
    fn clients_trim_trailing_slash() {
        let generator = HttpBillGenerator::new("http://localhost:4000/".into());
        assert_eq!(generator.base_url, "http://localhost:4000");
        let mailer = HttpMailer::new("http://relay:2525//".into(), MailSettings::default());
        assert_eq!(mailer.base_url, "http://relay:2525");
    }

    #[tokio::test]
    async fn unreachable_service_is_an_http_error() {
        // Port 9 (discard) on localhost is not expected to speak HTTP.
        let generator = HttpBillGenerator::new("http://127.0.0.1:9".into());
        let due = NaiveDate::from_ymd_opt(2024, 1, 19).unwrap();
        let err = generator.request_bill("n", Decimal::ONE, due).await.unwrap_err();
        assert!(matches!(err, BackendHttpError::Http(_)));
    }
}
