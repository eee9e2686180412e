//! Skips drafts that earlier runs already billed.
//!
//! Batches are expected to have been processed in full, in due-date order, so
//! history usually covers a contiguous prefix of the sorted batch. The default
//! strategy therefore computes a single resume point instead of checking
//! membership draft by draft.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::BillLedger;
use crate::draft::DebtDraft;

/// How already-billed drafts are removed from a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResumeStrategy {
    /// Resume right after the last id the ledger returned.
    ///
    /// Correct only when the ledger's last returned id is the latest-due
    /// billed draft; a ledger returning ids in another order can cause
    /// already-billed drafts to be kept or unbilled ones dropped.
    #[default]
    LastReturned,
    /// Drop exactly the drafts whose id the ledger knows.
    Membership,
}

impl fmt::Display for ResumeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResumeStrategy::LastReturned => "last-returned",
            ResumeStrategy::Membership => "membership",
        })
    }
}

impl FromStr for ResumeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-returned" => Ok(ResumeStrategy::LastReturned),
            "membership" => Ok(ResumeStrategy::Membership),
            other => Err(format!(
                "unknown resume strategy {other:?} (expected last-returned or membership)"
            )),
        }
    }
}

/// Drafts left to bill after consulting history.
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub drafts: Vec<DebtDraft>,
    pub skipped: usize,
}

/// Index of the first draft to process, given ids in batch order and the
/// ids the ledger reported as processed (in ledger order).
///
/// - nothing processed: start at 0
/// - everything processed: start past the end
/// - otherwise: start right after the last reported id's batch position
pub fn resume_point(draft_ids: &[String], processed: &[String]) -> usize {
    let Some(last) = processed.last() else {
        return 0;
    };
    if processed.len() == draft_ids.len() {
        return draft_ids.len();
    }
    match draft_ids.iter().position(|id| id == last) {
        Some(index) => index + 1,
        None => {
            warn!(reference_id = %last, "ledger returned an id outside the batch");
            0
        }
    }
}

/// Query `ledger` for the batch's ids and drop drafts already billed.
pub fn filter_processed<L: BillLedger>(
    drafts: Vec<DebtDraft>,
    ledger: &L,
    strategy: ResumeStrategy,
) -> Result<Pending, L::Error> {
    let draft_ids: Vec<String> = drafts.iter().map(|d| d.id.clone()).collect();
    if draft_ids.is_empty() {
        return Ok(Pending {
            drafts,
            skipped: 0,
        });
    }

    let processed = ledger.find_existing(&draft_ids)?;
    if processed.is_empty() {
        info!(pending = drafts.len(), "no billed debts found in batch");
        return Ok(Pending {
            drafts,
            skipped: 0,
        });
    }

    let total = drafts.len();
    let pending = match strategy {
        ResumeStrategy::LastReturned => {
            let mut drafts = drafts;
            drafts.split_off(resume_point(&draft_ids, &processed))
        }
        ResumeStrategy::Membership => {
            let done: HashSet<&str> = processed.iter().map(String::as_str).collect();
            drafts
                .into_iter()
                .filter(|draft| !done.contains(draft.id.as_str()))
                .collect()
        }
    };
    let skipped = total - pending.len();
    info!(
        %strategy,
        found = processed.len(),
        skipped,
        pending = pending.len(),
        "billed debts found in batch"
    );
    Ok(Pending {
        drafts: pending,
        skipped,
    })
}
