use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::open_ledger;
use crate::dates::DateRange;
use crate::error::{LedgerError, Result};
use crate::fmt::money;
use crate::models::{LineItem, PaymentMethod};
use crate::money::invoice_total;
use crate::settings::load_settings;
use crate::store::{add_invoice, load_snapshot, NewInvoice};

/// `QTY:PRICE` with a whole quantity of at least 1, or a bare `PRICE`
/// (quantity 1).
pub(crate) fn parse_line_item(raw: &str) -> Result<LineItem> {
    let bad = || LedgerError::InvalidLineItem(raw.to_string());
    let (qty, price) = match raw.split_once(':') {
        Some((q, p)) => (q.trim().parse::<f64>().map_err(|_| bad())?, p),
        None => (1.0, raw),
    };
    let price = price.trim().parse::<f64>().map_err(|_| bad())?;
    if !qty.is_finite() || qty < 1.0 || qty.fract() != 0.0 || !price.is_finite() || price < 0.0 {
        return Err(bad());
    }
    Ok(LineItem {
        item_id: None,
        quantity: Some(qty),
        unit_price: Some(price),
    })
}

pub(crate) fn parse_payment_method(s: &str) -> Result<PaymentMethod> {
    match s.trim().to_lowercase().as_str() {
        "" | "none" => Ok(PaymentMethod::None),
        "cash" => Ok(PaymentMethod::Cash),
        "card" => Ok(PaymentMethod::Card),
        "bank" => Ok(PaymentMethod::Bank),
        other => Err(LedgerError::Other(format!(
            "unknown payment method {other:?} (expected none, cash, card or bank)"
        ))),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    number: &str,
    date: &str,
    invoice_type: &str,
    items: &[String],
    seller: Option<String>,
    documented_date: Option<String>,
    payment_method: &str,
    payment_date: Option<String>,
) -> Result<()> {
    let items = items
        .iter()
        .map(|raw| parse_line_item(raw))
        .collect::<Result<Vec<_>>>()?;
    let conn = open_ledger()?;
    let invoice = NewInvoice {
        seller_id: seller,
        invoice_number: number.to_string(),
        documented_date,
        invoice_date: date.to_string(),
        invoice_type: invoice_type.to_string(),
        items,
        payment_method: parse_payment_method(payment_method)?,
        payment_date,
    };
    add_invoice(&conn, &invoice)?;
    let symbol = load_settings().currency_symbol;
    println!(
        "Added invoice {number} ({} line(s), {}) on {date}",
        invoice.items.len(),
        money(invoice_total(&invoice.items), &symbol)
    );
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
    table.set_header(vec!["Date", "Number", "Type", "Seller", "Lines", "Paid", "Total"]);
    let mut count = 0;
    let mut total = 0.0;
    for invoice in snapshot.invoices.iter().filter(|i| range.contains(&i.invoice_date)) {
        let amount = invoice_total(&invoice.items);
        total += amount;
        count += 1;
        table.add_row(vec![
            Cell::new(&invoice.invoice_date),
            Cell::new(&invoice.invoice_number),
            Cell::new(&invoice.invoice_type),
            Cell::new(invoice.seller_id.as_deref().unwrap_or("")),
            Cell::new(invoice.items.len()),
            Cell::new(invoice.payment_method.as_str()),
            Cell::new(money(amount, &symbol)).set_alignment(CellAlignment::Right),
        ]);
    }

    if count == 0 {
        println!("No invoices recorded.");
        return Ok(());
    }
    println!("Invoices\n{table}");
    println!("{count} invoice(s), total {}", money(total, &symbol));
    Ok(())
}
