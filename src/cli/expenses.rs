use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::invoices::parse_payment_method;
use crate::cli::open_ledger;
use crate::dates::DateRange;
use crate::error::Result;
use crate::fmt::money;
use crate::money::coerce_amount;
use crate::pnl::OTHER_LABEL;
use crate::settings::load_settings;
use crate::store::{add_expense, add_expense_type, delete_expense_type, load_snapshot, NewExpense};

pub fn add(
    amount: f64,
    date: &str,
    type_id: &str,
    description: &str,
    payment_method: &str,
    payment_date: Option<String>,
) -> Result<()> {
    let conn = open_ledger()?;
    let expense = NewExpense {
        date: date.to_string(),
        type_id: type_id.trim().to_string(),
        description: description.to_string(),
        amount,
        payment_method: parse_payment_method(payment_method)?,
        payment_date,
    };
    add_expense(&conn, &expense)?;
    let symbol = load_settings().currency_symbol;
    println!("Added {} expense of {} on {date}", expense.type_id, money(amount, &symbol));
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
    table.set_header(vec!["Date", "Type", "Description", "Paid", "Amount"]);
    let mut count = 0;
    let mut total = 0.0;
    for expense in snapshot.expenses.iter().filter(|e| range.contains(&e.date)) {
        let type_name = expense
            .type_id
            .as_deref()
            .and_then(|id| snapshot.expense_type(id))
            .map(|t| t.name.as_str())
            .unwrap_or(OTHER_LABEL);
        let amount = coerce_amount(expense.amount);
        total += amount;
        count += 1;
        table.add_row(vec![
            Cell::new(&expense.date),
            Cell::new(type_name),
            Cell::new(&expense.description),
            Cell::new(expense.payment_method.as_str()),
            Cell::new(money(amount, &symbol)).set_alignment(CellAlignment::Right),
        ]);
    }

    if count == 0 {
        println!("No expenses recorded.");
        return Ok(());
    }
    println!("Expenses\n{table}");
    println!("{count} expense(s), total {}", money(total, &symbol));
    Ok(())
}

pub fn add_type(name: &str, id: Option<&str>) -> Result<()> {
    let conn = open_ledger()?;
    let id = add_expense_type(&conn, id, name)?;
    println!("Added expense type: {} ({id})", name.trim());
    Ok(())
}

pub fn list_types() -> Result<()> {
    let conn = open_ledger()?;
    let snapshot = load_snapshot(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Expenses"]);
    for t in &snapshot.expense_types {
        let used = snapshot
            .expenses
            .iter()
            .filter(|e| e.type_id.as_deref() == Some(t.id.as_str()))
            .count();
        table.add_row(vec![Cell::new(&t.id), Cell::new(&t.name), Cell::new(used)]);
    }
    println!("Expense Types\n{table}");
    Ok(())
}

pub fn delete_type(id: &str) -> Result<()> {
    let conn = open_ledger()?;
    delete_expense_type(&conn, id)?;
    println!("Deleted expense type: {id}");
    Ok(())
}
