//! Reads and writes ledger records. Reports never touch the database
//! directly; they work from the snapshot returned by [`load_snapshot`].

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::dates::require_canonical_date;
use crate::error::{LedgerError, Result};
use crate::models::{
    ExpenseType, Invoice, LedgerSnapshot, LineItem, OtherExpense, PaymentMethod, SaleEntry, SaleType,
};

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn require_non_negative(amount: f64) -> Result<f64> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(LedgerError::Other(format!("amount must be zero or more, got {amount}")))
    }
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

pub struct NewSale {
    pub date: String,
    pub sale_type: SaleType,
    pub description: String,
    pub amount: f64,
}

pub fn add_sale(conn: &Connection, sale: &NewSale) -> Result<String> {
    let date = require_canonical_date(&sale.date)?;
    let amount = require_non_negative(sale.amount)?;
    let id = new_id();
    conn.execute(
        "INSERT INTO sales (id, date, sale_type, description, amount) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, date, sale.sale_type.as_str(), sale.description, amount],
    )?;
    tracing::debug!(%id, %date, amount, "added sale");
    Ok(id)
}

fn insert_sale(conn: &Connection, sale: &SaleEntry) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO sales (id, date, sale_type, description, amount, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(NULLIF(?6, ''), datetime('now')))",
        params![
            sale.id,
            sale.date,
            sale.sale_type.as_str(),
            sale.description,
            sale.amount,
            sale.created_at
        ],
    )?;
    Ok(())
}

fn load_sales(conn: &Connection) -> Result<Vec<SaleEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, sale_type, description, amount, COALESCE(created_at, '') \
         FROM sales ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(SaleEntry {
            id: row.get(0)?,
            date: row.get(1)?,
            sale_type: SaleType::parse_lenient(&row.get::<_, String>(2)?),
            description: row.get(3)?,
            amount: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

pub struct NewInvoice {
    pub seller_id: Option<String>,
    pub invoice_number: String,
    pub documented_date: Option<String>,
    pub invoice_date: String,
    pub invoice_type: String,
    pub items: Vec<LineItem>,
    pub payment_method: PaymentMethod,
    pub payment_date: Option<String>,
}

pub fn add_invoice(conn: &Connection, new: &NewInvoice) -> Result<String> {
    let invoice_date = require_canonical_date(&new.invoice_date)?;
    let documented_date = match &new.documented_date {
        Some(d) => require_canonical_date(d)?,
        None => invoice_date.clone(),
    };
    let payment_date = match &new.payment_date {
        Some(d) => require_canonical_date(d)?,
        None => String::new(),
    };
    let invoice = Invoice {
        id: new_id(),
        seller_id: new.seller_id.clone(),
        invoice_number: new.invoice_number.clone(),
        documented_date,
        invoice_date,
        invoice_type: new.invoice_type.trim().to_string(),
        items: new.items.clone(),
        payment_method: new.payment_method,
        payment_date,
    };
    let tx = conn.unchecked_transaction()?;
    insert_invoice(&tx, &invoice)?;
    tx.commit()?;
    tracing::debug!(id = %invoice.id, number = %invoice.invoice_number, "added invoice");
    Ok(invoice.id)
}

fn insert_invoice(conn: &Connection, invoice: &Invoice) -> Result<()> {
    conn.execute("DELETE FROM invoice_items WHERE invoice_id = ?1", [&invoice.id])?;
    conn.execute(
        "INSERT OR REPLACE INTO invoices \
         (id, seller_id, invoice_number, documented_date, invoice_date, invoice_type, payment_method, payment_date) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            invoice.id,
            invoice.seller_id,
            invoice.invoice_number,
            invoice.documented_date,
            invoice.invoice_date,
            invoice.invoice_type,
            invoice.payment_method.as_str(),
            invoice.payment_date,
        ],
    )?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO invoice_items (invoice_id, position, item_id, quantity, unit_price) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (position, item) in invoice.items.iter().enumerate() {
        stmt.execute(params![
            invoice.id,
            position as i64,
            item.item_id,
            item.quantity,
            item.unit_price
        ])?;
    }
    Ok(())
}

fn load_invoices(conn: &Connection) -> Result<Vec<Invoice>> {
    let mut stmt = conn.prepare(
        "SELECT id, seller_id, invoice_number, documented_date, invoice_date, invoice_type, \
         payment_method, payment_date FROM invoices ORDER BY rowid",
    )?;
    let mut invoices = stmt
        .query_map([], |row| {
            Ok(Invoice {
                id: row.get(0)?,
                seller_id: row.get(1)?,
                invoice_number: row.get(2)?,
                documented_date: row.get(3)?,
                invoice_date: row.get(4)?,
                invoice_type: row.get(5)?,
                items: Vec::new(),
                payment_method: PaymentMethod::parse_lenient(&row.get::<_, String>(6)?),
                payment_date: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut item_stmt = conn.prepare(
        "SELECT item_id, quantity, unit_price FROM invoice_items \
         WHERE invoice_id = ?1 ORDER BY position",
    )?;
    for invoice in &mut invoices {
        invoice.items = item_stmt
            .query_map([&invoice.id], |row| {
                Ok(LineItem {
                    item_id: row.get(0)?,
                    quantity: row.get(1)?,
                    unit_price: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
    }
    Ok(invoices)
}

// ---------------------------------------------------------------------------
// Expense types
// ---------------------------------------------------------------------------

fn slugify(name: &str) -> String {
    let mut slug = String::new();
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub fn add_expense_type(conn: &Connection, id: Option<&str>, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::Other("expense type name cannot be empty".to_string()));
    }
    let id = match id {
        Some(id) => id.trim().to_string(),
        None => slugify(name),
    };
    if id.is_empty() {
        return Err(LedgerError::Other(format!("cannot derive an id from {name:?}; pass --id")));
    }
    let exists: bool = conn
        .prepare("SELECT 1 FROM expense_types WHERE id = ?1")?
        .exists([&id])?;
    if exists {
        return Err(LedgerError::Other(format!("expense type {id:?} already exists")));
    }
    conn.execute(
        "INSERT INTO expense_types (id, name, position) \
         VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1 FROM expense_types))",
        params![id, name],
    )?;
    Ok(id)
}

/// Refuses to delete a type that any expense still points at.
pub fn delete_expense_type(conn: &Connection, id: &str) -> Result<()> {
    let in_use: i64 = conn.query_row(
        "SELECT count(*) FROM other_expenses WHERE type_id = ?1",
        [id],
        |r| r.get(0),
    )?;
    if in_use > 0 {
        return Err(LedgerError::ExpenseTypeInUse(id.to_string(), in_use));
    }
    let deleted = conn.execute("DELETE FROM expense_types WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(LedgerError::UnknownExpenseType(id.to_string()));
    }
    Ok(())
}

fn insert_expense_type(conn: &Connection, t: &ExpenseType) -> Result<()> {
    let updated = conn.execute(
        "UPDATE expense_types SET name = ?2 WHERE id = ?1",
        params![t.id, t.name],
    )?;
    if updated == 0 {
        conn.execute(
            "INSERT INTO expense_types (id, name, position) \
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1 FROM expense_types))",
            params![t.id, t.name],
        )?;
    }
    Ok(())
}

fn load_expense_types(conn: &Connection) -> Result<Vec<ExpenseType>> {
    let mut stmt = conn.prepare("SELECT id, name FROM expense_types ORDER BY position, rowid")?;
    let rows = stmt.query_map([], |row| {
        Ok(ExpenseType {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Other expenses
// ---------------------------------------------------------------------------

pub struct NewExpense {
    pub date: String,
    pub type_id: String,
    pub description: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub payment_date: Option<String>,
}

pub fn add_expense(conn: &Connection, new: &NewExpense) -> Result<String> {
    let date = require_canonical_date(&new.date)?;
    let amount = require_non_negative(new.amount)?;
    let payment_date = match &new.payment_date {
        Some(d) => require_canonical_date(d)?,
        None => String::new(),
    };
    let known: Option<String> = conn
        .query_row("SELECT id FROM expense_types WHERE id = ?1", [&new.type_id], |r| r.get(0))
        .optional()?;
    if known.is_none() {
        return Err(LedgerError::UnknownExpenseType(new.type_id.clone()));
    }
    let expense = OtherExpense {
        id: new_id(),
        date,
        type_id: Some(new.type_id.clone()),
        description: new.description.clone(),
        amount: Some(amount),
        payment_method: new.payment_method,
        payment_date,
    };
    insert_expense(conn, &expense)?;
    Ok(expense.id)
}

fn insert_expense(conn: &Connection, e: &OtherExpense) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO other_expenses \
         (id, date, type_id, description, amount, payment_method, payment_date) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            e.id,
            e.date,
            e.type_id,
            e.description,
            e.amount,
            e.payment_method.as_str(),
            e.payment_date
        ],
    )?;
    Ok(())
}

fn load_expenses(conn: &Connection) -> Result<Vec<OtherExpense>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, type_id, description, amount, payment_method, payment_date \
         FROM other_expenses ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(OtherExpense {
            id: row.get(0)?,
            date: row.get(1)?,
            type_id: row.get(2)?,
            description: row.get(3)?,
            amount: row.get(4)?,
            payment_method: PaymentMethod::parse_lenient(&row.get::<_, String>(5)?),
            payment_date: row.get(6)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

pub fn load_snapshot(conn: &Connection) -> Result<LedgerSnapshot> {
    let snapshot = LedgerSnapshot {
        sales: load_sales(conn)?,
        invoices: load_invoices(conn)?,
        expenses: load_expenses(conn)?,
        expense_types: load_expense_types(conn)?,
    };
    tracing::debug!(
        sales = snapshot.sales.len(),
        invoices = snapshot.invoices.len(),
        expenses = snapshot.expenses.len(),
        expense_types = snapshot.expense_types.len(),
        "loaded ledger snapshot"
    );
    Ok(snapshot)
}

pub struct RecordCounts {
    pub sales: i64,
    pub invoices: i64,
    pub expenses: i64,
    pub expense_types: i64,
}

pub fn count_records(conn: &Connection) -> Result<RecordCounts> {
    let count = |table: &str| -> Result<i64> {
        Ok(conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
    };
    Ok(RecordCounts {
        sales: count("sales")?,
        invoices: count("invoices")?,
        expenses: count("other_expenses")?,
        expense_types: count("expense_types")?,
    })
}

// ---------------------------------------------------------------------------
// JSON import
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ImportResult {
    pub sales: usize,
    pub invoices: usize,
    pub expenses: usize,
    pub expense_types: usize,
    pub duplicate_file: bool,
}

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn ensure_id(id: &str) -> String {
    if id.trim().is_empty() {
        new_id()
    } else {
        id.to_string()
    }
}

/// Load a JSON ledger export. Records are written as-is (bad dates and
/// amounts included) and replace any existing record with the same id.
/// The same file is never imported twice.
pub fn import_json(conn: &Connection, file_path: &Path) -> Result<ImportResult> {
    let data = std::fs::read(file_path)?;
    let checksum = compute_checksum(&data);
    let seen = conn
        .prepare("SELECT 1 FROM imports WHERE checksum = ?1")?
        .exists([&checksum])?;
    if seen {
        tracing::info!(file = %file_path.display(), "file already imported, skipping");
        return Ok(ImportResult {
            duplicate_file: true,
            ..Default::default()
        });
    }

    let snapshot: LedgerSnapshot = serde_json::from_slice(&data)?;
    let tx = conn.unchecked_transaction()?;
    for t in &snapshot.expense_types {
        if t.id.trim().is_empty() {
            tracing::warn!(name = %t.name, "skipping imported expense type without an id");
            continue;
        }
        insert_expense_type(&tx, t)?;
    }
    for sale in &snapshot.sales {
        insert_sale(&tx, &SaleEntry { id: ensure_id(&sale.id), ..sale.clone() })?;
    }
    for invoice in &snapshot.invoices {
        insert_invoice(&tx, &Invoice { id: ensure_id(&invoice.id), ..invoice.clone() })?;
    }
    for expense in &snapshot.expenses {
        insert_expense(&tx, &OtherExpense { id: ensure_id(&expense.id), ..expense.clone() })?;
    }
    let record_count =
        snapshot.sales.len() + snapshot.invoices.len() + snapshot.expenses.len() + snapshot.expense_types.len();
    tx.execute(
        "INSERT INTO imports (filename, record_count, checksum) VALUES (?1, ?2, ?3)",
        params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            record_count as i64,
            checksum,
        ],
    )?;
    tx.commit()?;

    Ok(ImportResult {
        sales: snapshot.sales.len(),
        invoices: snapshot.invoices.len(),
        expenses: snapshot.expenses.len(),
        expense_types: snapshot.expense_types.len(),
        duplicate_file: false,
    })
}
