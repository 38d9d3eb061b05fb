use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::audit::audit;
use crate::cli::{open_ledger, parse_month_opt, year_or_current};
use crate::dashboard::{build_dashboard, CASHFLOW_SERIES};
use crate::dates::DateRange;
use crate::error::{LedgerError, Result};
use crate::fmt::money;
use crate::pnl::{calculate_pnl, drill_down, Months, PnlTable};
use crate::settings::load_settings;
use crate::store::load_snapshot;

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn num(v: f64) -> Cell {
    Cell::new(money(v, "")).set_alignment(CellAlignment::Right)
}

fn value_row(table: &mut Table, label: Cell, values: &Months, total: f64) {
    let mut row = vec![label];
    row.extend(values.iter().map(|v| num(*v)));
    row.push(num(total));
    table.add_row(row);
}

fn title(kind: &str, business_name: &str) -> String {
    if business_name.is_empty() {
        kind.to_string()
    } else {
        format!("{business_name} \u{b7} {kind}")
    }
}

fn render_pnl(pnl: &PnlTable) -> Table {
    let mut table = Table::new();
    let mut header = vec!["Category".to_string()];
    header.extend(MONTH_ABBR.iter().map(|m| m.to_string()));
    header.push("Total".to_string());
    table.set_header(header);

    let totals = &pnl.totals;
    value_row(&mut table, Cell::new("Sales".green().bold()), &pnl.sales, totals.sales);
    value_row(&mut table, Cell::new("COGS"), &pnl.cogs, totals.cogs);
    value_row(&mut table, Cell::new("Gross Profit".bold()), &pnl.gross_profit, totals.gross_profit);

    table.add_row(vec![Cell::new("OPERATING EXPENSES".red().bold())]);
    for (row, (_, total)) in pnl.expense_rows.iter().zip(&totals.expense_rows) {
        value_row(&mut table, Cell::new(format!("  {}", row.label)), &row.values, *total);
    }
    value_row(
        &mut table,
        Cell::new("Total Operating Expenses".bold()),
        &pnl.operating_expense_total,
        totals.operating_expense_total,
    );
    value_row(&mut table, Cell::new("EBIT".bold()), &pnl.ebit, totals.ebit);

    let net_label = if pnl.totals.net_earnings >= 0.0 {
        "Net Earnings".green().bold()
    } else {
        "Net Earnings".red().bold()
    };
    value_row(&mut table, Cell::new(net_label), &pnl.net_earnings, totals.net_earnings);
    table
}

pub fn pnl(year: Option<i32>) -> Result<()> {
    let conn = open_ledger()?;
    let snapshot = load_snapshot(&conn)?;
    let settings = load_settings();
    let pnl = calculate_pnl(year_or_current(year), &snapshot);

    println!(
        "{} {}\n{}",
        title("Profit & Loss", &settings.business_name),
        pnl.year,
        render_pnl(&pnl)
    );
    println!(
        "Net earnings: {}",
        money(pnl.totals.net_earnings, &settings.currency_symbol)
    );

    let diag = &pnl.diagnostics;
    if diag.undated_records > 0 {
        println!(
            "{}",
            format!(
                "{} record(s) with unreadable dates left out. Run `ledgerbook report audit`.",
                diag.undated_records
            )
            .yellow()
        );
    }
    if diag.unmatched_expenses > 0 {
        println!(
            "{}",
            format!("{} expense(s) with an unknown type booked under Other.", diag.unmatched_expenses)
                .yellow()
        );
    }
    for (raw, n) in &diag.unrecognized_invoice_types {
        println!(
            "{}",
            format!("{n} invoice(s) of type {raw:?} booked as Invoice Expenses.").yellow()
        );
    }
    Ok(())
}

pub fn dashboard(from_date: Option<String>, to_date: Option<String>) -> Result<()> {
    let range = DateRange::parse(from_date.as_deref(), to_date.as_deref())?;
    let conn = open_ledger()?;
    let snapshot = load_snapshot(&conn)?;
    let settings = load_settings();
    let symbol = settings.currency_symbol.as_str();
    let dash = build_dashboard(&snapshot, &range);

    let mut totals = Table::new();
    totals.set_header(vec!["", "Amount"]);
    let t = &dash.totals;
    for (label, value) in [
        ("Fiscal sales", t.fiscal_sales),
        ("Non-fiscal sales", t.non_fiscal_sales),
        ("Total sales", t.total_sales),
        ("Purchases", t.purchases),
        ("Other expenses", t.other_expenses),
    ] {
        table_money_row(&mut totals, Cell::new(label), value, symbol);
    }
    let net_label = if t.net >= 0.0 { "Net".green().bold() } else { "Net".red().bold() };
    table_money_row(&mut totals, Cell::new(net_label), t.net, symbol);
    println!("{}\n{totals}", title("Dashboard", &settings.business_name));

    if dash.cashflow.labels.is_empty() {
        println!("No records in range.");
        return Ok(());
    }

    let mut monthly = Table::new();
    let mut header = vec!["Month"];
    header.extend(CASHFLOW_SERIES);
    header.push("Net");
    monthly.set_header(header);
    for (i, label) in dash.cashflow.labels.iter().enumerate() {
        let column = |s: usize| dash.cashflow.values[s][i];
        let net = column(0) + column(1) - column(2) - column(3);
        let label_cell = if label.is_unknown() {
            Cell::new(label.to_string().yellow())
        } else {
            Cell::new(label)
        };
        let mut row = vec![label_cell];
        row.extend((0..CASHFLOW_SERIES.len()).map(|s| num(column(s))));
        row.push(num(net));
        monthly.add_row(row);
    }
    println!("\nBy month\n{monthly}");

    if !dash.payment_methods.is_empty() {
        let mut methods = Table::new();
        methods.set_header(vec!["Payment method", "Records"]);
        for (method, n) in &dash.payment_methods {
            methods.add_row(vec![Cell::new(method.as_str()), Cell::new(n)]);
        }
        println!("\nPurchases and expenses by payment method\n{methods}");
    }
    Ok(())
}

fn table_money_row(table: &mut Table, label: Cell, value: f64, symbol: &str) {
    table.add_row(vec![
        label,
        Cell::new(money(value, symbol)).set_alignment(CellAlignment::Right),
    ]);
}

pub fn drilldown(year: Option<i32>, month: &str, row: &str) -> Result<()> {
    let (month_year, month) = parse_month_opt(month)?;
    let year = match (year, month_year) {
        (Some(y), Some(my)) if y != my => {
            return Err(LedgerError::Other(format!(
                "--year {y} conflicts with --month {my}-{month:02}"
            )))
        }
        (y, my) => year_or_current(y.or(my)),
    };

    let conn = open_ledger()?;
    let snapshot = load_snapshot(&conn)?;
    let symbol = load_settings().currency_symbol;
    let pnl = calculate_pnl(year, &snapshot);
    let target = pnl.find_row(row)?;
    let cell = pnl
        .row_values(&target)
        .map(|values| values[month as usize - 1])
        .unwrap_or(0.0);

    let records = drill_down(&snapshot, year, month, &target);
    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Amount", "ID"]);
    for r in &records {
        table.add_row(vec![
            Cell::new(r.date()),
            Cell::new(r.description()),
            Cell::new(money(r.amount(), &symbol)).set_alignment(CellAlignment::Right),
            Cell::new(r.id()),
        ]);
    }

    println!("{} \u{b7} {year}-{month:02}", row.trim());
    if records.is_empty() {
        println!("No records.");
    } else {
        println!("{table}");
    }
    println!("{} record(s), total {}", records.len(), money(cell, &symbol));
    Ok(())
}

pub fn audit_report() -> Result<()> {
    let conn = open_ledger()?;
    let snapshot = load_snapshot(&conn)?;
    let report = audit(&snapshot);

    if report.is_clean() {
        println!("{} records checked, no problems found.", report.records_checked);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Record", "ID", "Problem"]);
    for f in &report.findings {
        table.add_row(vec![
            Cell::new(f.kind.as_str()),
            Cell::new(&f.id),
            Cell::new(&f.problem),
        ]);
    }
    println!("Data problems\n{table}");
    println!(
        "{} records checked, {} problem(s): {} in the Unknown month, {} counted as zero.",
        report.records_checked,
        report.findings.len(),
        report.unknown_bucketed(),
        report.zero_coerced()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LedgerSnapshot, SaleEntry, SaleType};

    #[test]
    fn test_render_pnl_has_all_sections() {
        let snapshot = LedgerSnapshot {
            sales: vec![SaleEntry {
                id: "s1".into(),
                date: "2024-03-02".into(),
                sale_type: SaleType::Fiscal,
                description: String::new(),
                amount: Some(1500.0),
                created_at: String::new(),
            }],
            ..Default::default()
        };
        let rendered = render_pnl(&calculate_pnl(2024, &snapshot)).to_string();
        for label in ["Sales", "COGS", "Gross Profit", "Total Operating Expenses", "EBIT", "Net Earnings"] {
            assert!(rendered.contains(label), "missing {label}");
        }
        assert!(rendered.contains("1,500.00"));
    }

    #[test]
    fn test_title() {
        assert_eq!(title("Dashboard", ""), "Dashboard");
        assert_eq!(title("Dashboard", "Corner Shop"), "Corner Shop \u{b7} Dashboard");
    }
}
