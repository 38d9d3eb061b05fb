use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::open_ledger;
use crate::dates::DateRange;
use crate::error::{LedgerError, Result};
use crate::fmt::money;
use crate::models::SaleType;
use crate::money::coerce_amount;
use crate::settings::load_settings;
use crate::store::{add_sale, load_snapshot, NewSale};

pub(crate) fn parse_sale_type(s: &str) -> Result<SaleType> {
    match s.trim().to_lowercase().as_str() {
        "fiscal" => Ok(SaleType::Fiscal),
        "non-fiscal" | "nonfiscal" | "non_fiscal" => Ok(SaleType::NonFiscal),
        other => Err(LedgerError::Other(format!(
            "unknown sale type {other:?} (expected fiscal or non-fiscal)"
        ))),
    }
}

pub fn add(amount: f64, date: &str, sale_type: &str, description: &str) -> Result<()> {
    let conn = open_ledger()?;
    let sale = NewSale {
        date: date.to_string(),
        sale_type: parse_sale_type(sale_type)?,
        description: description.to_string(),
        amount,
    };
    add_sale(&conn, &sale)?;
    let symbol = load_settings().currency_symbol;
    println!("Added {} sale of {} on {date}", sale.sale_type.as_str(), money(amount, &symbol));
    Ok(())
}

pub fn list(year: Option<i32>) -> Result<()> {
    let conn = open_ledger()?;
    let snapshot = load_snapshot(&conn)?;
    let range = year
        .map(DateRange::year)
        .transpose()?
        .unwrap_or_else(DateRange::unbounded);
    let symbol = load_settings().currency_symbol;

    let mut table = Table::new();
    table.set_header(vec!["Date", "Type", "Description", "Amount"]);
    let mut total = 0.0;
    let mut count = 0;
    for sale in snapshot.sales.iter().filter(|s| range.contains(&s.date)) {
        let amount = coerce_amount(sale.amount);
        total += amount;
        count += 1;
        table.add_row(vec![
            Cell::new(&sale.date),
            Cell::new(sale.sale_type.as_str()),
            Cell::new(&sale.description),
            Cell::new(money(amount, &symbol)).set_alignment(CellAlignment::Right),
        ]);
    }

    if count == 0 {
        println!("No sales recorded.");
        return Ok(());
    }
    println!("Sales\n{table}");
    println!("{count} sale(s), total {}", money(total, &symbol));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sale_type() {
        assert_eq!(parse_sale_type("Fiscal").unwrap(), SaleType::Fiscal);
        assert_eq!(parse_sale_type("non-fiscal").unwrap(), SaleType::NonFiscal);
        assert!(parse_sale_type("cash").is_err());
    }
}
