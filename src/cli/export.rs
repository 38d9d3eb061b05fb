use std::path::PathBuf;

use crate::cli::{open_ledger, year_or_current};
use crate::dashboard::{build_dashboard, CASHFLOW_SERIES};
use crate::dates::DateRange;
use crate::error::Result;
use crate::export::{
    expense_header, expense_rows, invoice_header, invoice_rows, pnl_header, pnl_rows,
    sales_header, sales_rows, series_header, series_rows, write_csv, Row,
};
use crate::pnl::calculate_pnl;
use crate::settings::get_data_dir;
use crate::store::load_snapshot;

fn default_path(name: &str) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    get_data_dir().join("exports").join(format!("{name}-{date}.csv"))
}

/// Writes to `output`, the default export path, or stdout for `-`.
fn emit(name: &str, output: Option<String>, header: &[String], rows: &[Row]) -> Result<()> {
    if output.as_deref() == Some("-") {
        return write_csv(std::io::stdout().lock(), header, rows);
    }
    let path = output.map(PathBuf::from).unwrap_or_else(|| default_path(name));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_csv(std::fs::File::create(&path)?, header, rows)?;
    println!("Wrote {} ({} rows)", path.display(), rows.len());
    Ok(())
}

pub fn pnl(year: Option<i32>, output: Option<String>) -> Result<()> {
    let conn = open_ledger()?;
    let snapshot = load_snapshot(&conn)?;
    let table = calculate_pnl(year_or_current(year), &snapshot);
    emit(
        &format!("pnl-{}", table.year),
        output,
        &pnl_header(&table),
        &pnl_rows(&table),
    )
}

pub fn series(from_date: Option<String>, to_date: Option<String>, output: Option<String>) -> Result<()> {
    let range = DateRange::parse(from_date.as_deref(), to_date.as_deref())?;
    let conn = open_ledger()?;
    let snapshot = load_snapshot(&conn)?;
    let dash = build_dashboard(&snapshot, &range);
    emit(
        "series",
        output,
        &series_header(&CASHFLOW_SERIES),
        &series_rows(&dash.cashflow),
    )
}

pub fn sales(from_date: Option<String>, to_date: Option<String>, output: Option<String>) -> Result<()> {
    let range = DateRange::parse(from_date.as_deref(), to_date.as_deref())?;
    let snapshot = load_snapshot(&open_ledger()?)?;
    emit("sales", output, &sales_header(), &sales_rows(&snapshot, &range))
}

pub fn invoices(from_date: Option<String>, to_date: Option<String>, output: Option<String>) -> Result<()> {
    let range = DateRange::parse(from_date.as_deref(), to_date.as_deref())?;
    let snapshot = load_snapshot(&open_ledger()?)?;
    emit("invoices", output, &invoice_header(), &invoice_rows(&snapshot, &range))
}

pub fn expenses(from_date: Option<String>, to_date: Option<String>, output: Option<String>) -> Result<()> {
    let range = DateRange::parse(from_date.as_deref(), to_date.as_deref())?;
    let snapshot = load_snapshot(&open_ledger()?)?;
    emit("expenses", output, &expense_header(), &expense_rows(&snapshot, &range))
}
