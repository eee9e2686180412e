//! Per-draft billing: generate the bill, then notify the debtor.

use tracing::{debug, error};

use crate::backend::{BillGenerator, Notifier};
use crate::draft::{BillRecord, DebtDraft};
use crate::error::IngestError;

/// Bill one draft. Nothing is persisted here; the caller collects the record.
pub async fn bill_draft(
    draft: &DebtDraft,
    generator: &dyn BillGenerator,
    notifier: &dyn Notifier,
) -> Result<BillRecord, IngestError> {
    debug!(debt_id = %draft.id, "generating bill");
    let bill_url = generator
        .generate(&draft.name, draft.amount, draft.due_date)
        .await
        .map_err(|source| {
            error!(debt_id = %draft.id, error = %source, "bill generation failed");
            IngestError::BillGeneration {
                debt_id: draft.id.clone(),
                source,
            }
        })?;
    debug!(debt_id = %draft.id, %bill_url, "bill generated");

    notifier
        .send(&draft.email, &bill_url)
        .await
        .map_err(|source| {
            error!(debt_id = %draft.id, receiver = %draft.email, error = %source, "sending bill failed");
            IngestError::SendEmail {
                debt_id: draft.id.clone(),
                source,
            }
        })?;
    debug!(debt_id = %draft.id, receiver = %draft.email, "bill sent");

    Ok(BillRecord {
        reference_id: draft.id.clone(),
        bill_url,
    })
}

/// Bill every draft in order. The first failure aborts the batch and the
/// records produced so far are discarded with it.
pub async fn bill_all(
    drafts: &[DebtDraft],
    generator: &dyn BillGenerator,
    notifier: &dyn Notifier,
) -> Result<Vec<BillRecord>, IngestError> {
    let mut bills = Vec::with_capacity(drafts.len());
    for draft in drafts {
        bills.push(bill_draft(draft, generator, notifier).await?);
    }
    Ok(bills)
}
