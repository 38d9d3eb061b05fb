use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sales (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    sale_type TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    amount REAL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS invoices (
    id TEXT PRIMARY KEY,
    seller_id TEXT,
    invoice_number TEXT NOT NULL DEFAULT '',
    documented_date TEXT NOT NULL DEFAULT '',
    invoice_date TEXT NOT NULL,
    invoice_type TEXT NOT NULL DEFAULT '',
    payment_method TEXT NOT NULL DEFAULT 'none',
    payment_date TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS invoice_items (
    id INTEGER PRIMARY KEY,
    invoice_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    item_id TEXT,
    quantity REAL,
    unit_price REAL,
    FOREIGN KEY (invoice_id) REFERENCES invoices(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS expense_types (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    position INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS other_expenses (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    type_id TEXT,
    description TEXT NOT NULL DEFAULT '',
    amount REAL,
    payment_method TEXT NOT NULL DEFAULT 'none',
    payment_date TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    checksum TEXT NOT NULL
);
";

// (id, name)
const DEFAULT_EXPENSE_TYPES: &[(&str, &str)] = &[
    ("rent", "Rent"),
    ("utilities", "Utilities"),
    ("salaries", "Salaries"),
    ("transport", "Transport"),
    ("bank-fees", "Bank Fees"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM expense_types", [], |row| row.get(0))?;
    if count == 0 {
        for (position, (id, name)) in DEFAULT_EXPENSE_TYPES.iter().enumerate() {
            conn.execute(
                "INSERT INTO expense_types (id, name, position) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, name, position as i64],
            )?;
        }
        tracing::debug!(count = DEFAULT_EXPENSE_TYPES.len(), "seeded default expense types");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["sales", "invoices", "invoice_items", "expense_types", "other_expenses", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM expense_types", [], |r| r.get(0)).unwrap();
        assert_eq!(count, DEFAULT_EXPENSE_TYPES.len() as i64);
    }

    #[test]
    fn test_init_db_seeds_expense_types_in_order() {
        let (_dir, conn) = test_db();
        let first: String = conn
            .query_row("SELECT name FROM expense_types ORDER BY position LIMIT 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(first, "Rent");
    }
}
