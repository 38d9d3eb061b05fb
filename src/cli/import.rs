use std::path::PathBuf;

use crate::audit::audit;
use crate::cli::open_ledger;
use crate::error::Result;
use crate::store::{import_json, load_snapshot};

pub fn run(file: &str) -> Result<()> {
    let file_path = PathBuf::from(file);
    let conn = open_ledger()?;

    let result = import_json(&conn, &file_path)?;
    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }

    println!(
        "Imported {} sale(s), {} invoice(s), {} expense(s), {} expense type(s)",
        result.sales, result.invoices, result.expenses, result.expense_types
    );

    let report = audit(&load_snapshot(&conn)?);
    if !report.is_clean() {
        println!(
            "{} data problem(s) found. Run `ledgerbook report audit` for details.",
            report.findings.len()
        );
    }
    Ok(())
}
