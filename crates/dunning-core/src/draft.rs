//! Debt records as they move through one ingestion run.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A validated debt parsed from one row of an uploaded batch, not yet billed.
///
/// Lives only for the duration of a run; the ledger never sees drafts, only
/// the [`BillRecord`]s produced from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtDraft {
    /// External debtor id. Becomes the ledger's `reference_id`.
    pub id: String,
    pub name: String,
    pub government_id: String,
    pub email: String,
    /// Always strictly positive.
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

/// Outcome of billing one draft, persisted in bulk at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRecord {
    pub reference_id: String,
    pub bill_url: String,
}

/// A bill row as stored by the ledger, with its surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedBill {
    pub id: i64,
    pub reference_id: String,
    pub bill_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_serializes_with_snake_case_keys() {
        let draft = DebtDraft {
            id: "ea23f2ca-663a-4266-a742-9da4c9f455b3".into(),
            name: "Elijah Santos".into(),
            government_id: "9558".into(),
            email: "janet95@example.com".into(),
            amount: Decimal::new(7811, 0),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 19).unwrap(),
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["id"], "ea23f2ca-663a-4266-a742-9da4c9f455b3");
        assert_eq!(json["government_id"], "9558");
        assert_eq!(json["due_date"], "2024-01-19");
        assert!(json.get("debtId").is_none());
    }

    #[test]
    fn bill_record_json_roundtrip() {
        let bill = BillRecord {
            reference_id: "acc1794e".into(),
            bill_url: "https://valid.file.url".into(),
        };
        let json = serde_json::to_string(&bill).unwrap();
        let parsed: BillRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bill);
    }
}
