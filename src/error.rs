use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),

    #[error("Invalid line item (expected QTY:PRICE): {0}")]
    InvalidLineItem(String),

    #[error("Unknown expense type: {0}")]
    UnknownExpenseType(String),

    #[error("Expense type {0} is still referenced by {1} expense(s)")]
    ExpenseTypeInUse(String, i64),

    #[error("Unknown report row: {0}")]
    UnknownRow(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
