//! One ingestion run: load, skip billed history, bill, store.
//!
//! Stages advance linearly `Loaded → Filtered → Processed → Stored → Done`.
//! Any stage failure ends the run with an [`ErrorEnvelope`]; bills are only
//! written in the final stage, so a failed run leaves the ledger untouched.

use std::fmt;
use std::time::Instant;

use tracing::{error, info};

use crate::backend::{BillGenerator, BillLedger, Notifier};
use crate::config::IngestConfig;
use crate::error::{ErrorEnvelope, IngestError};
use crate::history::filter_processed;
use crate::loader::load_drafts;
use crate::pipeline::bill_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Loaded,
    Filtered,
    Processed,
    Stored,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStage::Loaded => "loaded",
            RunStage::Filtered => "filtered",
            RunStage::Processed => "processed",
            RunStage::Stored => "stored",
            RunStage::Done => "done",
        })
    }
}

/// Counts from a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub loaded: usize,
    pub skipped: usize,
    pub billed: usize,
}

/// Reject uploads whose name does not end in `.csv`, before reading them.
pub fn ensure_csv_filename(filename: &str) -> Result<(), IngestError> {
    if filename.ends_with(".csv") {
        Ok(())
    } else {
        Err(IngestError::InvalidFile(filename.to_string()))
    }
}

/// A single request-scoped ingestion. The ledger borrow lasts exactly as long
/// as the run.
pub struct Ingestion<'a, L: BillLedger> {
    config: &'a IngestConfig,
    ledger: &'a mut L,
    generator: &'a dyn BillGenerator,
    notifier: &'a dyn Notifier,
}

impl<'a, L: BillLedger> Ingestion<'a, L> {
    pub fn new(
        config: &'a IngestConfig,
        ledger: &'a mut L,
        generator: &'a dyn BillGenerator,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            ledger,
            generator,
            notifier,
        }
    }

    /// Check the upload's file name, then run the batch.
    pub async fn submit(self, filename: &str, bytes: &[u8]) -> Result<RunReport, ErrorEnvelope> {
        if let Err(err) = ensure_csv_filename(filename) {
            info!(filename, "rejected upload with invalid file extension");
            return Err(err.envelope());
        }
        info!(filename, "processing upload");
        self.run(bytes).await
    }

    /// Process one uploaded batch.
    pub async fn run(self, bytes: &[u8]) -> Result<RunReport, ErrorEnvelope> {
        let started = Instant::now();
        let mut stage = None;
        match self.execute(bytes, &mut stage).await {
            Ok(report) => {
                info!(
                    loaded = report.loaded,
                    skipped = report.skipped,
                    billed = report.billed,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "ingestion {}",
                    RunStage::Done
                );
                Ok(report)
            }
            Err(err) => {
                let envelope = err.envelope();
                let last_stage = stage.map_or_else(|| "started".to_string(), |s: RunStage| s.to_string());
                error!(kind = %envelope.kind, code = envelope.kind.code(), after = %last_stage, error = %err, "ingestion failed");
                Err(envelope)
            }
        }
    }

    async fn execute(
        self,
        bytes: &[u8],
        stage: &mut Option<RunStage>,
    ) -> Result<RunReport, IngestError> {
        let clock = Instant::now();
        let drafts = load_drafts(bytes)?;
        let loaded = drafts.len();
        *stage = Some(stage_done(RunStage::Loaded, clock));

        let clock = Instant::now();
        let pending = filter_processed(drafts, &*self.ledger, self.config.resume)
            .map_err(|e| IngestError::HistoryLookup(Box::new(e)))?;
        *stage = Some(stage_done(RunStage::Filtered, clock));

        let clock = Instant::now();
        info!(pending = pending.drafts.len(), "billing pending debts");
        let bills = bill_all(&pending.drafts, self.generator, self.notifier).await?;
        *stage = Some(stage_done(RunStage::Processed, clock));

        let clock = Instant::now();
        if !bills.is_empty() {
            self.ledger
                .insert_all(&bills)
                .map_err(|e| IngestError::StoreBills(Box::new(e)))?;
        }
        *stage = Some(stage_done(RunStage::Stored, clock));

        Ok(RunReport {
            loaded,
            skipped: pending.skipped,
            billed: bills.len(),
        })
    }
}

fn stage_done(stage: RunStage, clock: Instant) -> RunStage {
    info!(%stage, elapsed_ms = clock.elapsed().as_millis() as u64, "stage complete");
    stage
}
