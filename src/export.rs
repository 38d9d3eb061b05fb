use std::io::Write;

use crate::dates::DateRange;
use crate::models::LedgerSnapshot;
use crate::money::{coerce_amount, invoice_total};
use crate::pnl::{PnlTable, OTHER_LABEL};
use crate::series::AlignedSeries;

pub const OPERATING_EXPENSES_HEADER: &str = "Operating Expenses";

pub type Row = Vec<String>;

/// Two decimals, never "-0.00".
pub fn fixed2(v: f64) -> String {
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{v:.2}")
}

fn value_row(label: &str, values: &[f64; 12]) -> Row {
    let mut row = Vec::with_capacity(14);
    row.push(label.to_string());
    row.extend(values.iter().map(|v| fixed2(*v)));
    row.push(fixed2(values.iter().sum()));
    row
}

pub fn pnl_header(table: &PnlTable) -> Row {
    let mut header = vec!["Category".to_string()];
    header.extend(table.months.iter().map(|m| m.to_string()));
    header.push("Total".to_string());
    header
}

/// P&L as flat rows: label, twelve monthly values, full-year total.
pub fn pnl_rows(table: &PnlTable) -> Vec<Row> {
    let mut rows = vec![
        value_row("Sales", &table.sales),
        value_row("COGS", &table.cogs),
        value_row("Gross Profit", &table.gross_profit),
    ];

    let mut section = vec![OPERATING_EXPENSES_HEADER.to_string()];
    section.resize(14, String::new());
    rows.push(section);

    for r in &table.expense_rows {
        rows.push(value_row(&r.label, &r.values));
    }
    rows.push(value_row("Total Operating Expenses", &table.operating_expense_total));
    rows.push(value_row("EBIT", &table.ebit));
    rows.push(value_row("Net Earnings", &table.net_earnings));
    rows
}

pub fn series_header(names: &[&str]) -> Row {
    let mut header = vec!["Month".to_string()];
    header.extend(names.iter().map(|n| n.to_string()));
    header
}

/// One row per month label, one column per aligned series.
pub fn series_rows(series: &AlignedSeries) -> Vec<Row> {
    series
        .labels
        .iter()
        .enumerate()
        .map(|(k, label)| {
            let mut row = vec![label.to_string()];
            row.extend(series.values.iter().map(|values| fixed2(values[k])));
            row
        })
        .collect()
}

pub fn sales_header() -> Row {
    ["Date", "Type", "Description", "Amount"].map(String::from).to_vec()
}

pub fn sales_rows(snapshot: &LedgerSnapshot, range: &DateRange) -> Vec<Row> {
    snapshot
        .sales
        .iter()
        .filter(|s| range.contains(&s.date))
        .map(|s| {
            vec![
                s.date.clone(),
                s.sale_type.as_str().to_string(),
                s.description.clone(),
                fixed2(coerce_amount(s.amount)),
            ]
        })
        .collect()
}

pub fn invoice_header() -> Row {
    [
        "Invoice Number",
        "Invoice Date",
        "Documented Date",
        "Seller",
        "Type",
        "Items",
        "Total",
        "Payment Method",
        "Payment Date",
    ]
    .map(String::from)
    .to_vec()
}

pub fn invoice_rows(snapshot: &LedgerSnapshot, range: &DateRange) -> Vec<Row> {
    snapshot
        .invoices
        .iter()
        .filter(|i| range.contains(&i.invoice_date))
        .map(|i| {
            vec![
                i.invoice_number.clone(),
                i.invoice_date.clone(),
                i.documented_date.clone(),
                i.seller_id.clone().unwrap_or_default(),
                i.invoice_type.clone(),
                i.items.len().to_string(),
                fixed2(invoice_total(&i.items)),
                i.payment_method.as_str().to_string(),
                i.payment_date.clone(),
            ]
        })
        .collect()
}

pub fn expense_header() -> Row {
    ["Date", "Type", "Description", "Amount", "Payment Method", "Payment Date"]
        .map(String::from)
        .to_vec()
}

pub fn expense_rows(snapshot: &LedgerSnapshot, range: &DateRange) -> Vec<Row> {
    snapshot
        .expenses
        .iter()
        .filter(|e| range.contains(&e.date))
        .map(|e| {
            let type_name = e
                .type_id
                .as_deref()
                .and_then(|id| snapshot.expense_type(id))
                .map_or(OTHER_LABEL, |t| t.name.as_str());
            vec![
                e.date.clone(),
                type_name.to_string(),
                e.description.clone(),
                fixed2(coerce_amount(e.amount)),
                e.payment_method.as_str().to_string(),
                e.payment_date.clone(),
            ]
        })
        .collect()
}

pub fn write_csv<W: Write>(writer: W, header: &[String], rows: &[Row]) -> crate::error::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}
