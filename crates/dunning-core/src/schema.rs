/// Column names of an uploaded debt batch.
pub mod upload {
    pub const DEBT_ID: &str = "debtId";
    pub const NAME: &str = "name";
    pub const GOVERNMENT_ID: &str = "governmentId";
    pub const EMAIL: &str = "email";
    pub const DEBT_AMOUNT: &str = "debtAmount";
    pub const DEBT_DUE_DATE: &str = "debtDueDate";

    /// Every column a valid row must carry. Other columns are ignored.
    pub const REQUIRED: [&str; 6] = [NAME, GOVERNMENT_ID, EMAIL, DEBT_AMOUNT, DEBT_DUE_DATE, DEBT_ID];
}

/// Layout of the durable `debts` table.
pub mod ledger {
    pub const TABLE: &str = "debts";
    pub const ID_SEQUENCE: &str = "debts_id_seq";

    /// Idempotent DDL for the bills table.
    ///
    /// `reference_id` is unique, which also gives it the index used by
    /// containment lookups.
    pub fn create_statements() -> String {
        format!(
            "CREATE SEQUENCE IF NOT EXISTS {ID_SEQUENCE} START 1;
            CREATE TABLE IF NOT EXISTS {TABLE} (
                id BIGINT PRIMARY KEY DEFAULT nextval('{ID_SEQUENCE}'),
                reference_id VARCHAR NOT NULL UNIQUE,
                bill_url VARCHAR NOT NULL
            );"
        )
    }
}
