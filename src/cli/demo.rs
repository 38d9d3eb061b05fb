use chrono::{Datelike, Local, NaiveDate};
use rusqlite::Connection;

use crate::cli::open_ledger;
use crate::error::Result;
use crate::models::{LineItem, PaymentMethod, SaleType};
use crate::store::{add_expense, add_invoice, add_sale, NewExpense, NewInvoice, NewSale};

const DEMO_SELLER: &str = "demo-wholesale";
const MONTHS: u32 = 18;

/// Expenses booked every month against the default expense types.
struct RecurringExpense {
    day: u32,
    type_id: &'static str,
    description: &'static str,
    amount: f64,
    method: PaymentMethod,
}

const RECURRING: &[RecurringExpense] = &[
    RecurringExpense { day: 1, type_id: "rent", description: "Shop rent", amount: 1200.00, method: PaymentMethod::Bank },
    RecurringExpense { day: 10, type_id: "utilities", description: "Electricity", amount: 145.30, method: PaymentMethod::Bank },
    RecurringExpense { day: 28, type_id: "salaries", description: "Part-time assistant", amount: 1650.00, method: PaymentMethod::Bank },
    RecurringExpense { day: 28, type_id: "bank-fees", description: "Card terminal fees", amount: 18.40, method: PaymentMethod::Bank },
];

/// Stock purchased on product invoices: (item id, unit price).
const STOCK: &[(&str, f64)] = &[
    ("coffee-beans-1kg", 14.50),
    ("milk-crate", 9.80),
    ("paper-cups-500", 22.00),
    ("pastry-tray", 31.25),
];

/// Weekly takings: (fiscal, non-fiscal).
const TAKINGS: &[(f64, f64)] = &[
    (820.0, 140.0),
    (760.0, 95.0),
    (910.0, 120.0),
    (1040.0, 180.0),
];

struct DemoMonth {
    sales: Vec<NewSale>,
    invoices: Vec<NewInvoice>,
    expenses: Vec<NewExpense>,
}

fn clamp_day(year: i32, month: u32, day: u32) -> u32 {
    let last_day = NaiveDate::from_ymd_opt(year, month + 1, 1)
        .or_else(|| NaiveDate::from_ymd_opt(year + 1, 1, 1))
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28);
    day.min(last_day)
}

fn make_date(year: i32, month: u32, day: u32) -> String {
    let d = clamp_day(year, month, day);
    format!("{year:04}-{month:02}-{d:02}")
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn generate_month(idx: usize, year: i32, month: u32) -> DemoMonth {
    let mut sales = Vec::new();
    // Weekly takings, varied by up to ~4% per month.
    let vary = 1.0 + ((idx % 9) as f64 - 4.0) * 0.01;
    for (week, (fiscal, non_fiscal)) in TAKINGS.iter().enumerate() {
        let date = make_date(year, month, 7 * week as u32 + 6);
        sales.push(NewSale {
            date: date.clone(),
            sale_type: SaleType::Fiscal,
            description: format!("Week {} register", week + 1),
            amount: round2(fiscal * vary),
        });
        sales.push(NewSale {
            date,
            sale_type: SaleType::NonFiscal,
            description: "Catering cash".to_string(),
            amount: round2(non_fiscal * vary),
        });
    }

    let stock_items = (0..3)
        .map(|j| {
            let (item_id, price) = STOCK[(idx + j) % STOCK.len()];
            LineItem {
                item_id: Some(item_id.to_string()),
                quantity: Some((4 + (idx + j) % 5) as f64),
                unit_price: Some(price),
            }
        })
        .collect();
    let mut invoices = vec![NewInvoice {
        seller_id: Some(DEMO_SELLER.to_string()),
        invoice_number: format!("DEMO-{year}{month:02}-P"),
        documented_date: None,
        invoice_date: make_date(year, month, 4),
        invoice_type: "product".to_string(),
        items: stock_items,
        payment_method: PaymentMethod::Card,
        payment_date: Some(make_date(year, month, 5)),
    }];
    if idx % 3 == 0 {
        invoices.push(NewInvoice {
            seller_id: Some("demo-maintenance".to_string()),
            invoice_number: format!("DEMO-{year}{month:02}-S"),
            documented_date: None,
            invoice_date: make_date(year, month, 16),
            invoice_type: "service".to_string(),
            items: vec![LineItem { item_id: None, quantity: Some(1.0), unit_price: Some(240.0) }],
            payment_method: PaymentMethod::Bank,
            payment_date: None,
        });
    }

    let mut expenses: Vec<NewExpense> = RECURRING
        .iter()
        .map(|r| NewExpense {
            date: make_date(year, month, r.day),
            type_id: r.type_id.to_string(),
            description: r.description.to_string(),
            amount: r.amount,
            payment_method: r.method,
            payment_date: Some(make_date(year, month, r.day)),
        })
        .collect();
    if idx % 2 == 1 {
        expenses.push(NewExpense {
            date: make_date(year, month, 19),
            type_id: "transport".to_string(),
            description: "Delivery van fuel".to_string(),
            amount: round2(62.0 + (idx % 4) as f64 * 7.5),
            payment_method: PaymentMethod::Cash,
            payment_date: None,
        });
    }

    DemoMonth { sales, invoices, expenses }
}

/// Demo records for the 18 months ending with the current month.
fn generate() -> Vec<DemoMonth> {
    let today = Local::now().date_naive();
    (0..MONTHS)
        .map(|i| {
            let target = today - chrono::Months::new(MONTHS - 1 - i);
            generate_month(i as usize, target.year(), target.month())
        })
        .collect()
}

struct DemoCounts {
    sales: usize,
    invoices: usize,
    expenses: usize,
}

fn insert_demo_data(conn: &Connection) -> Result<DemoCounts> {
    let mut counts = DemoCounts { sales: 0, invoices: 0, expenses: 0 };
    for month in generate() {
        for sale in &month.sales {
            add_sale(conn, sale)?;
            counts.sales += 1;
        }
        for invoice in &month.invoices {
            add_invoice(conn, invoice)?;
            counts.invoices += 1;
        }
        for expense in &month.expenses {
            add_expense(conn, expense)?;
            counts.expenses += 1;
        }
    }
    Ok(counts)
}

fn demo_loaded(conn: &Connection) -> Result<bool> {
    Ok(conn
        .prepare("SELECT 1 FROM invoices WHERE seller_id = ?1")?
        .exists([DEMO_SELLER])?)
}

pub fn run() -> Result<()> {
    let conn = open_ledger()?;
    if demo_loaded(&conn)? {
        println!("Demo data already loaded.");
        return Ok(());
    }

    let counts = insert_demo_data(&conn)?;
    println!("Demo data loaded!");
    println!("  Sales:     {}", counts.sales);
    println!("  Invoices:  {}", counts.invoices);
    println!("  Expenses:  {}", counts.expenses);
    println!();
    println!("Try these next:");
    println!("  ledgerbook report pnl");
    println!("  ledgerbook report dashboard");
    println!("  ledgerbook report drilldown --month {} --row Rent", Local::now().month());
    println!("  ledgerbook export pnl --output -");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::pnl::calculate_pnl;
    use crate::store::load_snapshot;

    #[test]
    fn test_generate_counts() {
        let months = generate();
        assert_eq!(months.len(), MONTHS as usize);
        let sales: usize = months.iter().map(|m| m.sales.len()).sum();
        assert_eq!(sales, MONTHS as usize * TAKINGS.len() * 2);
        let invoices: usize = months.iter().map(|m| m.invoices.len()).sum();
        // One product invoice per month plus a service invoice every third month.
        assert_eq!(invoices, MONTHS as usize + 6);
    }

    #[test]
    fn test_generate_spans_current_month() {
        let today = Local::now().date_naive();
        let prefix = format!("{:04}-{:02}-", today.year(), today.month());
        let last = generate().pop().unwrap();
        assert!(last.sales.iter().all(|s| s.date.starts_with(&prefix)));
    }

    #[test]
    fn test_make_date_clamps_month_end() {
        assert_eq!(make_date(2023, 2, 31), "2023-02-28");
        assert_eq!(make_date(2024, 2, 31), "2024-02-29");
        assert_eq!(make_date(2024, 12, 31), "2024-12-31");
    }

    #[test]
    fn test_demo_inserts_and_reports() {
        let (_dir, conn) = test_db();
        assert!(!demo_loaded(&conn).unwrap());
        let counts = insert_demo_data(&conn).unwrap();
        assert!(demo_loaded(&conn).unwrap());

        let snapshot = load_snapshot(&conn).unwrap();
        assert_eq!(snapshot.sales.len(), counts.sales);
        assert_eq!(snapshot.invoices.len(), counts.invoices);
        assert_eq!(snapshot.expenses.len(), counts.expenses);

        let pnl = calculate_pnl(Local::now().year(), &snapshot);
        assert!(pnl.totals.sales > 0.0);
        assert!(pnl.totals.cogs > 0.0);
        assert_eq!(pnl.diagnostics.unmatched_expenses, 0);
        assert_eq!(pnl.diagnostics.undated_records, 0);
    }
}
