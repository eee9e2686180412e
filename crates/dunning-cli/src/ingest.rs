//! Upload handling: filename check, one ingestion run, envelope rendering.

use std::path::Path;

use anyhow::Context;
use dunning_backends::{HttpBillGenerator, HttpMailer, NoopNotifier, StaticBillGenerator};
use dunning_core::{
    BillGenerator, ErrorResponse, IngestConfig, Ingestion, MailSettings, Notifier, RunReport,
    ensure_csv_filename,
};
use dunning_store::DuckStore;
use tracing::info;

/// The generation and notification backends used for a run.
pub struct Backends {
    generator: Box<dyn BillGenerator>,
    notifier: Box<dyn Notifier>,
}

impl Backends {
    /// Always-succeeding local backends.
    pub fn stub(mail: MailSettings) -> Self {
        Self {
            generator: Box::new(StaticBillGenerator::default()),
            notifier: Box::new(NoopNotifier::new(mail)),
        }
    }

    /// HTTP backends where an endpoint is given, stubs elsewhere.
    pub fn from_endpoints(
        bill_endpoint: Option<String>,
        mail_endpoint: Option<String>,
        mail: MailSettings,
    ) -> Self {
        let generator: Box<dyn BillGenerator> = match bill_endpoint {
            Some(url) => {
                info!(url = %url, "using remote bill generator");
                Box::new(HttpBillGenerator::new(url))
            }
            None => Box::new(StaticBillGenerator::default()),
        };
        let notifier: Box<dyn Notifier> = match mail_endpoint {
            Some(url) => {
                info!(url = %url, "using remote mail relay");
                Box::new(HttpMailer::new(url, mail))
            }
            None => Box::new(NoopNotifier::new(mail)),
        };
        Self {
            generator,
            notifier,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Billed(RunReport),
    Rejected(ErrorResponse),
}

/// Run one upload against `store`.
pub async fn submit_upload(
    store: &mut DuckStore,
    config: &IngestConfig,
    backends: &Backends,
    filename: &str,
    bytes: &[u8],
) -> Outcome {
    let ingestion = Ingestion::new(
        config,
        store,
        backends.generator.as_ref(),
        backends.notifier.as_ref(),
    );
    match ingestion.submit(filename, bytes).await {
        Ok(report) => Outcome::Billed(report),
        Err(envelope) => Outcome::Rejected(config.respond(&envelope)),
    }
}

/// Run the CSV file at `path`. The name is checked before the file is read.
pub async fn submit_path(
    store: &mut DuckStore,
    config: &IngestConfig,
    backends: &Backends,
    path: &Path,
) -> anyhow::Result<Outcome> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Err(err) = ensure_csv_filename(&filename) {
        info!(file = %path.display(), "file extension invalid, not reading");
        return Ok(Outcome::Rejected(config.respond(&err.envelope())));
    }
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(submit_upload(store, config, backends, &filename, &bytes).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dunning_core::BillLedger;

    const HEADER: &str = "name,governmentId,email,debtAmount,debtDueDate,debtId";

    const FIRST_SIX: &[&str] = &[
        "Elijah Santos,9558,janet95@example.com,7811,2024-01-19,ea23f2ca-663a-4266-a742-9da4c9f455b3",
        "Samuel Orr,5486,linmichael@example.com,5662,2023-02-25,acc1794e-b264-4fab-8bb7-3400d4c4734d",
        "Leslie Morgan,9611,russellwolfe@example.net,6177,2022-10-17,9f5a2b0c-967e-4443-a03d-9d7cdcb22155",
        "Joseph Rivera,1126,urangel@example.org,7409,2023-08-16,33bec852-beee-477f-ae65-1475c74e1966",
        "Jessica James,1525,lisa11@example.net,5829,2024-01-18,e2dba21b-5520-4226-82b5-90c6bb3356c55",
        "Charles Fields,1874,melissa18@example.net,7685,2024-05-12,f94d431b-4629-4880-b4a8-047116ec5fc5",
    ];

    const LAST_SEVEN: &[&str] = &[
        "Kelly Sanchez,7032,erindavis@example.com,5932,2024-05-08,cd3359c9-e5ce-42ef-926d-b28ec70556b3",
        "Bryan Villarreal,4133,douglasevans@example.net,5235,2024-04-21,674388d1-ebb9-4ec3-8e7e-0776a8855dc9",
        "Dennis Davis,7479,angela12@example.com,9269,2022-10-23,a65abc5f-4760-42a5-9dc3-a68526e48a5f",
        "Crystal Williams,5352,annabrown@example.org,8779,2023-11-19,3f378517-33ba-4dc5-9595-28bd87ca921e",
        "Deanna Williams,9954,rschmidt@example.net,9619,2023-11-24,04b3b8fd-fc5a-42dc-bf37-1719da45538",
        "Jordan Davis,5168,masondavid@example.com,5081,2022-12-25,140c85f1-ac06-4389-ad9f-71c704a61d55",
        "Charles Aguirre,1507,westjeremy@example.com,4640,2023-04-01,42f374d0-3491-498c-84c7-44038b45fab8",
    ];

    fn csv(rows: &[&str]) -> Vec<u8> {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text.into_bytes()
    }

    fn all_thirteen() -> Vec<&'static str> {
        FIRST_SIX.iter().chain(LAST_SEVEN).copied().collect()
    }

    fn fixture() -> (DuckStore, IngestConfig, Backends) {
        let config = IngestConfig::default();
        let backends = Backends::stub(config.mail.clone());
        (DuckStore::open().unwrap(), config, backends)
    }

    fn billed(outcome: Outcome) -> RunReport {
        match outcome {
            Outcome::Billed(report) => report,
            Outcome::Rejected(response) => panic!("upload rejected: {response:?}"),
        }
    }

    fn rejected(outcome: Outcome) -> ErrorResponse {
        match outcome {
            Outcome::Rejected(response) => response,
            Outcome::Billed(report) => panic!("upload accepted: {report:?}"),
        }
    }

    #[tokio::test]
    async fn thirteen_rows_are_all_stored() {
        let (mut store, config, backends) = fixture();
        let report = billed(
            submit_upload(&mut store, &config, &backends, "valid_filename.csv", &csv(&all_thirteen()))
                .await,
        );

        assert_eq!(report.billed, 13);
        assert_eq!(store.bill_count().unwrap(), 13);
        let submitted: Vec<String> = all_thirteen()
            .iter()
            .map(|row| row.rsplit(',').next().unwrap().to_string())
            .collect();
        let mut found = store.find_existing(&submitted).unwrap();
        let mut expected = submitted.clone();
        found.sort();
        expected.sort();
        assert_eq!(found, expected);
        let stored = store.list_bills().unwrap();
        assert!(stored.iter().all(|b| b.bill_url == "https://valid.file.url"));
        // Rows were billed in due-date order: Leslie Morgan (2022-10-17) first.
        assert_eq!(stored[0].reference_id, "9f5a2b0c-967e-4443-a03d-9d7cdcb22155");
    }

    #[tokio::test]
    async fn partial_uploads_accumulate() {
        let (mut store, config, backends) = fixture();

        billed(submit_upload(&mut store, &config, &backends, "valid_filename.csv", &csv(FIRST_SIX)).await);
        assert_eq!(store.bill_count().unwrap(), 6);

        billed(submit_upload(&mut store, &config, &backends, "valid_filename.csv", &csv(LAST_SEVEN)).await);
        assert_eq!(store.bill_count().unwrap(), 13);
    }

    #[tokio::test]
    async fn resubmitting_resumes_after_billed_prefix() {
        let (mut store, config, backends) = fixture();
        billed(submit_upload(&mut store, &config, &backends, "valid_filename.csv", &csv(FIRST_SIX)).await);

        // FIRST_SIX sorted by due date ends with Charles Fields (2024-05-12), so
        // appending rows due later resumes right after it.
        let mut rows = FIRST_SIX.to_vec();
        rows.push("Late Payer,1,late@example.com,10,2025-01-01,late-1");
        rows.push("Later Payer,2,later@example.com,10,2025-02-01,late-2");
        let report = billed(
            submit_upload(&mut store, &config, &backends, "valid_filename.csv", &csv(&rows)).await,
        );

        assert_eq!(report.skipped, 6);
        assert_eq!(report.billed, 2);
        assert_eq!(store.bill_count().unwrap(), 8);
    }

    #[tokio::test]
    async fn resubmitting_a_billed_batch_is_a_no_op() {
        let (mut store, config, backends) = fixture();
        let bytes = csv(&all_thirteen());
        billed(submit_upload(&mut store, &config, &backends, "valid_filename.csv", &bytes).await);
        let report = billed(submit_upload(&mut store, &config, &backends, "valid_filename.csv", &bytes).await);

        assert_eq!(report.billed, 0);
        assert_eq!(store.bill_count().unwrap(), 13);
    }

    #[tokio::test]
    async fn invalid_date_is_rejected_and_nothing_stored() {
        let (mut store, config, backends) = fixture();
        let bytes = csv(&[
            "valid name,9558,valid@email.com,7811,20241-19,ea23f2ca-663a-4266-a742-9da4c9f455b3",
        ]);
        let response = rejected(submit_upload(&mut store, &config, &backends, "valid_filename.csv", &bytes).await);

        assert_eq!(response.status, 400);
        assert_eq!(response.body.msg, "File data isn`t valid.");
        let reason = response.body.reason.unwrap();
        assert_eq!(reason[0]["errors"][0]["field"], "debtDueDate");
        assert_eq!(store.bill_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn non_csv_upload_is_rejected() {
        let (mut store, config, backends) = fixture();
        let response = rejected(submit_upload(&mut store, &config, &backends, "invalid_file.txt", b"ping pong").await);

        assert_eq!(response.status, 400);
        assert_eq!(response.body.msg, "Invalid file.");
        assert!(response.body.reason.is_none());
        assert_eq!(store.bill_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn non_csv_path_is_not_read() {
        let (mut store, config, backends) = fixture();
        // The file does not exist; rejection must happen before any read.
        let outcome = submit_path(&mut store, &config, &backends, Path::new("/nonexistent/debts.txt"))
            .await
            .unwrap();
        assert_eq!(rejected(outcome).status, 400);
    }

    #[tokio::test]
    async fn csv_path_is_read_and_billed() {
        let (mut store, config, backends) = fixture();
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("debts.csv");
        std::fs::write(&path, csv(FIRST_SIX)).unwrap();

        let report = billed(submit_path(&mut store, &config, &backends, &path).await.unwrap());
        assert_eq!(report.billed, 6);
    }

    #[tokio::test]
    async fn missing_csv_file_is_an_io_error() {
        let (mut store, config, backends) = fixture();
        let result = submit_path(&mut store, &config, &backends, Path::new("/nonexistent/debts.csv")).await;
        assert!(result.is_err());
    }
}
