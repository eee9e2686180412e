//! DuckDB ledger of issued bills.

use std::path::Path;

use duckdb::{Connection, params, params_from_iter};
use dunning_core::schema::ledger::{self, TABLE};
use dunning_core::{BillLedger, BillRecord, ProcessedBill};
use tracing::{debug, info};

use crate::StoreError;

/// DuckDB store holding one row per billed debt in the `debts` table.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for file-backed storage that survives across process restarts. The table
/// is created on open if missing.
pub struct DuckStore {
    conn: Connection,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        Self::with_schema(Connection::open_in_memory()?)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let store = Self::with_schema(Connection::open(path)?)?;
        info!(path = %path.display(), bills = store.bill_count()?, "opened bill ledger");
        Ok(store)
    }

    fn with_schema(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(&ledger::create_statements())?;
        Ok(Self { conn })
    }

    // ── Reads ──

    /// Number of stored bills.
    pub fn bill_count(&self) -> Result<usize, StoreError> {
        let sql = format!("SELECT count(*)::BIGINT FROM {TABLE}");
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| StoreError::Other(format!("negative count {count}")))
    }

    /// Every stored bill in insertion order.
    pub fn list_bills(&self) -> Result<Vec<ProcessedBill>, StoreError> {
        let sql = format!("SELECT id, reference_id, bill_url FROM {TABLE} ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let bills = stmt
            .query_map([], |row| {
                Ok(ProcessedBill {
                    id: row.get(0)?,
                    reference_id: row.get(1)?,
                    bill_url: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bills)
    }

    /// Fetch the bill issued for one reference id.
    pub fn get_bill(&self, reference_id: &str) -> Result<ProcessedBill, StoreError> {
        let sql = format!("SELECT id, reference_id, bill_url FROM {TABLE} WHERE reference_id = ?");
        let found = self.conn.query_row(&sql, [reference_id], |row| {
            Ok(ProcessedBill {
                id: row.get(0)?,
                reference_id: row.get(1)?,
                bill_url: row.get(2)?,
            })
        });
        match found {
            Ok(bill) => Ok(bill),
            Err(duckdb::Error::QueryReturnedNoRows) => Err(StoreError::NoResults),
            Err(e) => Err(e.into()),
        }
    }

    /// Reference ids from `reference_ids` that are already stored, oldest first.
    pub fn existing_reference_ids(
        &self,
        reference_ids: &[String],
    ) -> Result<Vec<String>, StoreError> {
        if reference_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; reference_ids.len()].join(", ");
        let sql = format!(
            "SELECT reference_id FROM {TABLE} WHERE reference_id IN ({placeholders}) ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(reference_ids.iter()), |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        debug!(queried = reference_ids.len(), found = found.len(), "bill history lookup");
        Ok(found)
    }

    // ── Writes ──

    /// Insert all bills in one transaction. On any error the transaction is
    /// dropped unfinished and rolls back, leaving no partial rows.
    pub fn insert_bills(&mut self, bills: &[BillRecord]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let sql = format!("INSERT INTO {TABLE} (reference_id, bill_url) VALUES (?, ?)");
            let mut stmt = tx.prepare(&sql)?;
            for bill in bills {
                stmt.execute(params![bill.reference_id, bill.bill_url])?;
            }
        }
        tx.commit()?;
        info!(count = bills.len(), "stored bills");
        Ok(())
    }
}

impl BillLedger for DuckStore {
    type Error = StoreError;

    fn find_existing(&self, reference_ids: &[String]) -> Result<Vec<String>, Self::Error> {
        self.existing_reference_ids(reference_ids)
    }

    fn insert_all(&mut self, bills: &[BillRecord]) -> Result<(), Self::Error> {
        self.insert_bills(bills)
    }
}
