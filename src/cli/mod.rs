pub mod demo;
pub mod expenses;
pub mod export;
pub mod import;
pub mod init;
pub mod invoices;
pub mod report;
pub mod sales;
pub mod status;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::dates::MonthKey;
use crate::db::{get_connection, init_db};
use crate::error::{LedgerError, Result};
use crate::settings::db_path;

/// Open the configured ledger, creating the schema on first use.
pub(crate) fn open_ledger() -> Result<Connection> {
    let path = db_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = get_connection(&path)?;
    init_db(&conn)?;
    Ok(conn)
}

/// Default report year: the current calendar year.
pub(crate) fn year_or_current(year: Option<i32>) -> i32 {
    year.unwrap_or_else(|| chrono::Datelike::year(&chrono::Local::now()))
}

/// `--month` as `1`-`12` or `YYYY-MM`; the year is returned when given.
pub(crate) fn parse_month_opt(month: &str) -> Result<(Option<i32>, u32)> {
    let month = month.trim();
    if let Some(MonthKey::Month { year, month }) = MonthKey::parse(month) {
        return Ok((Some(year), month));
    }
    match month.parse::<u32>() {
        Ok(m) if (1..=12).contains(&m) => Ok((None, m)),
        _ => Err(LedgerError::Other(format!(
            "invalid month {month:?} (expected 1-12 or YYYY-MM)"
        ))),
    }
}

#[derive(Parser)]
#[command(
    name = "ledgerbook",
    about = "Sales, purchase and expense ledger with monthly Profit & Loss reporting."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up ledgerbook: choose a data directory and initialize the database.
    Init {
        /// Path for ledgerbook data (default: ~/Documents/ledgerbook)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Business name shown on reports
        #[arg(long = "business-name")]
        business_name: Option<String>,
        /// Currency symbol used for display
        #[arg(long)]
        currency: Option<String>,
    },
    /// Record and list sales.
    Sales {
        #[command(subcommand)]
        command: SalesCommands,
    },
    /// Record and list purchase invoices.
    Invoices {
        #[command(subcommand)]
        command: InvoicesCommands,
    },
    /// Manage the expense type catalog.
    #[command(name = "expense-types")]
    ExpenseTypes {
        #[command(subcommand)]
        command: ExpenseTypesCommands,
    },
    /// Record and list miscellaneous expenses.
    Expenses {
        #[command(subcommand)]
        command: ExpensesCommands,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export reports and ledgers to CSV.
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Import a JSON ledger export.
    Import {
        /// Path to JSON file
        file: String,
    },
    /// Load sample data to explore ledgerbook.
    Demo,
    /// Show current database and record counts.
    Status,
}

#[derive(Subcommand)]
pub enum SalesCommands {
    /// Record a sale.
    Add {
        /// Sale amount
        amount: f64,
        /// Sale date: YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// fiscal or non-fiscal
        #[arg(long = "type", default_value = "fiscal")]
        sale_type: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List sales.
    List {
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand)]
pub enum InvoicesCommands {
    /// Record a purchase invoice.
    Add {
        /// Invoice number printed on the document
        #[arg(long)]
        number: String,
        /// Invoice date used for reporting: YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// product (cost of goods sold), service, or any other text (operating expense)
        #[arg(long = "type")]
        invoice_type: String,
        /// Line item as QTY:PRICE or PRICE; repeat for several lines
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        /// Seller reference
        #[arg(long)]
        seller: Option<String>,
        /// Date on the document, if different: YYYY-MM-DD
        #[arg(long = "documented-date")]
        documented_date: Option<String>,
        /// none, cash, card or bank
        #[arg(long = "payment-method", default_value = "none")]
        payment_method: String,
        #[arg(long = "payment-date")]
        payment_date: Option<String>,
    },
    /// List invoices.
    List {
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand)]
pub enum ExpenseTypesCommands {
    /// Add an expense type.
    Add {
        /// Display name, e.g. 'Rent'
        name: String,
        /// Stable id (default: derived from the name)
        #[arg(long)]
        id: Option<String>,
    },
    /// List expense types.
    List,
    /// Delete an unused expense type.
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ExpensesCommands {
    /// Record a miscellaneous expense.
    Add {
        amount: f64,
        /// Expense date: YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Expense type id (see `expense-types list`)
        #[arg(long = "type-id")]
        type_id: String,
        #[arg(long, default_value = "")]
        description: String,
        /// none, cash, card or bank
        #[arg(long = "payment-method", default_value = "none")]
        payment_method: String,
        #[arg(long = "payment-date")]
        payment_date: Option<String>,
    },
    /// List expenses.
    List {
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Monthly Profit & Loss for a year.
    Pnl {
        /// Year: YYYY (default: current year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Sales, purchases and expenses by month.
    Dashboard {
        /// Start date: YYYY-MM-DD
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long = "to")]
        to_date: Option<String>,
    },
    /// Records behind one Profit & Loss cell.
    Drilldown {
        #[arg(long)]
        year: Option<i32>,
        /// Month: 1-12 or YYYY-MM
        #[arg(long)]
        month: String,
        /// Row label or expense type id, e.g. Sales, COGS, 'Invoice Expenses', rent;
        /// 'other:unmatched' for expenses with an unknown type
        #[arg(long)]
        row: String,
    },
    /// Records with missing or unreadable data.
    Audit,
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Export Profit & Loss to CSV.
    Pnl {
        #[arg(long)]
        year: Option<i32>,
        /// Output path (default: <data_dir>/exports/pnl-<year>-<today>.csv, '-' for stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Export the monthly sales/purchases/expenses series to CSV.
    Series {
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Output path (default: <data_dir>/exports/series-<today>.csv, '-' for stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Export sales to CSV.
    Sales {
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Output path (default: <data_dir>/exports/sales-<today>.csv, '-' for stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Export invoices to CSV.
    Invoices {
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Output path (default: <data_dir>/exports/invoices-<today>.csv, '-' for stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Export miscellaneous expenses to CSV.
    Expenses {
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Output path (default: <data_dir>/exports/expenses-<today>.csv, '-' for stdout)
        #[arg(long)]
        output: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_opt() {
        assert_eq!(parse_month_opt("3").unwrap(), (None, 3));
        assert_eq!(parse_month_opt("2024-11").unwrap(), (Some(2024), 11));
        assert!(parse_month_opt("13").is_err());
        assert!(parse_month_opt("2024-xx").is_err());
        assert!(parse_month_opt("").is_err());
    }

    #[test]
    fn test_cli_parses_invoice_items() {
        let cli = Cli::try_parse_from([
            "ledgerbook", "invoices", "add", "--number", "A-1", "--date", "2024-01-20",
            "--type", "product", "--item", "2:30", "--item", "4.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Invoices { command: InvoicesCommands::Add { items, .. } } => {
                assert_eq!(items, vec!["2:30", "4.5"]);
            }
            _ => panic!("expected invoices add"),
        }
    }
}
