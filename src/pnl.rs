//! Profit & Loss for one calendar year, split into twelve monthly columns.
//!
//! Sales are revenue. Product invoices are cost of goods sold; every other
//! invoice is an operating expense and is gathered in a single
//! "Invoice Expenses" row. Miscellaneous expenses are grouped by their expense
//! type, with a catch-all "Other" row for expenses whose type can't be
//! resolved. There is no tax or interest modelling, so net earnings equal EBIT.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;

use crate::dates::{months_of_year, parse_date, MonthKey};
use crate::error::{LedgerError, Result};
use crate::models::{Invoice, LedgerSnapshot, OtherExpense, SaleEntry};
use crate::money::{coerce_amount, invoice_total};

pub const INVOICE_EXPENSES_LABEL: &str = "Invoice Expenses";
pub const OTHER_LABEL: &str = "Other";
/// Names the unmatched fallback row even when a catalog type is called "Other".
pub const UNMATCHED_OTHER_ALIAS: &str = "other:unmatched";

pub type Months = [f64; 12];

/// Where an operating expense lands. Display labels are attached separately so
/// that an expense type literally called "Other" never merges with the
/// unmatched fallback row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PnlCategory {
    InvoiceExpenses,
    Known(String),
    UnmatchedOther,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRow {
    pub category: PnlCategory,
    pub label: String,
    pub values: Months,
}

impl ExpenseRow {
    fn new(category: PnlCategory, label: &str) -> Self {
        Self {
            category,
            label: label.to_string(),
            values: [0.0; 12],
        }
    }

    pub fn total(&self) -> f64 {
        row_total(&self.values)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PnlTotals {
    pub sales: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub expense_rows: Vec<(PnlCategory, f64)>,
    pub operating_expense_total: f64,
    pub ebit: f64,
    pub net_earnings: f64,
}

/// Records the calculation absorbed rather than rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PnlDiagnostics {
    /// Records skipped because their date could not be read.
    pub undated_records: usize,
    /// Non-product invoices whose type is not "service" either, by raw type.
    pub unrecognized_invoice_types: BTreeMap<String, usize>,
    /// Expenses booked under "Other" because their type id didn't resolve.
    pub unmatched_expenses: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PnlTable {
    pub year: i32,
    pub months: [MonthKey; 12],
    pub sales: Months,
    pub cogs: Months,
    pub gross_profit: Months,
    pub expense_rows: Vec<ExpenseRow>,
    pub operating_expense_total: Months,
    pub ebit: Months,
    pub net_earnings: Months,
    pub totals: PnlTotals,
    pub diagnostics: PnlDiagnostics,
}

impl PnlTable {
    pub fn expense_row(&self, category: &PnlCategory) -> Option<&ExpenseRow> {
        self.expense_rows.iter().find(|r| &r.category == category)
    }

    /// Resolve a row label as shown in reports back to a drill-down target.
    /// Expense rows also answer to their type id, and the unmatched fallback
    /// to `other:unmatched`. Labels are tried first.
    pub fn find_row(&self, label: &str) -> Result<PnlRow> {
        let wanted = label.trim();
        if wanted.eq_ignore_ascii_case("sales") {
            return Ok(PnlRow::Sales);
        }
        if wanted.eq_ignore_ascii_case("cogs") {
            return Ok(PnlRow::Cogs);
        }
        let by_alias = |r: &&ExpenseRow| match &r.category {
            PnlCategory::Known(id) => id.eq_ignore_ascii_case(wanted),
            PnlCategory::UnmatchedOther => wanted.eq_ignore_ascii_case(UNMATCHED_OTHER_ALIAS),
            PnlCategory::InvoiceExpenses => false,
        };
        self.expense_rows
            .iter()
            .find(|r| r.label.eq_ignore_ascii_case(wanted))
            .or_else(|| self.expense_rows.iter().find(by_alias))
            .map(|r| PnlRow::Expense(r.category.clone()))
            .ok_or_else(|| LedgerError::UnknownRow(label.to_string()))
    }

    pub fn row_values(&self, row: &PnlRow) -> Option<&Months> {
        match row {
            PnlRow::Sales => Some(&self.sales),
            PnlRow::Cogs => Some(&self.cogs),
            PnlRow::Expense(category) => self.expense_row(category).map(|r| &r.values),
        }
    }
}

pub fn row_total(values: &Months) -> f64 {
    values.iter().sum()
}

/// Expense type id → name, first definition wins.
struct Catalog<'a> {
    names: HashMap<&'a str, &'a str>,
}

impl<'a> Catalog<'a> {
    fn new(snapshot: &'a LedgerSnapshot) -> Self {
        let mut names = HashMap::new();
        for t in &snapshot.expense_types {
            names.entry(t.id.as_str()).or_insert(t.name.as_str());
        }
        Self { names }
    }

    fn category_of(&self, expense: &OtherExpense) -> PnlCategory {
        match expense.type_id.as_deref() {
            Some(id) if self.names.contains_key(id) => PnlCategory::Known(id.to_string()),
            _ => PnlCategory::UnmatchedOther,
        }
    }
}

/// Zero-based month slot of `date` if it falls in `year`.
fn slot_in_year(date: &str, year: i32) -> Option<usize> {
    parse_date(date)
        .filter(|d| d.year() == year)
        .map(|d| d.month0() as usize)
}

fn is_service(invoice: &Invoice) -> bool {
    invoice.invoice_type.trim().eq_ignore_ascii_case("service")
}

pub fn calculate_pnl(year: i32, snapshot: &LedgerSnapshot) -> PnlTable {
    let mut diagnostics = PnlDiagnostics::default();
    let mut undated = |date: &str| {
        if parse_date(date).is_none() {
            diagnostics.undated_records += 1;
        }
    };

    let mut sales = [0.0; 12];
    for sale in &snapshot.sales {
        match slot_in_year(&sale.date, year) {
            Some(m) => sales[m] += coerce_amount(sale.amount),
            None => undated(&sale.date),
        }
    }

    let mut cogs = [0.0; 12];
    let mut invoice_expenses: Option<Months> = None;
    let mut unrecognized: BTreeMap<String, usize> = BTreeMap::new();
    for invoice in &snapshot.invoices {
        let Some(m) = slot_in_year(&invoice.invoice_date, year) else {
            undated(&invoice.invoice_date);
            continue;
        };
        let total = invoice_total(&invoice.items);
        if invoice.is_product() {
            cogs[m] += total;
        } else {
            invoice_expenses.get_or_insert([0.0; 12])[m] += total;
            if !is_service(invoice) {
                *unrecognized
                    .entry(invoice.invoice_type.trim().to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    let catalog = Catalog::new(snapshot);
    let mut expense_rows: Vec<ExpenseRow> = Vec::new();
    if let Some(values) = invoice_expenses {
        expense_rows.push(ExpenseRow {
            values,
            ..ExpenseRow::new(PnlCategory::InvoiceExpenses, INVOICE_EXPENSES_LABEL)
        });
    }
    let mut row_index: HashMap<PnlCategory, usize> = HashMap::new();
    for t in &snapshot.expense_types {
        let category = PnlCategory::Known(t.id.clone());
        if row_index.contains_key(&category) {
            continue;
        }
        row_index.insert(category.clone(), expense_rows.len());
        expense_rows.push(ExpenseRow::new(category, &t.name));
    }

    let mut unmatched_expenses = 0usize;
    for expense in &snapshot.expenses {
        let Some(m) = slot_in_year(&expense.date, year) else {
            undated(&expense.date);
            continue;
        };
        let category = catalog.category_of(expense);
        if category == PnlCategory::UnmatchedOther {
            unmatched_expenses += 1;
            tracing::debug!(
                expense = %expense.id,
                type_id = ?expense.type_id,
                "expense type not in catalog, booking under Other"
            );
        }
        let idx = *row_index.entry(category.clone()).or_insert_with(|| {
            expense_rows.push(ExpenseRow::new(category, OTHER_LABEL));
            expense_rows.len() - 1
        });
        expense_rows[idx].values[m] += coerce_amount(expense.amount);
    }
    diagnostics.unrecognized_invoice_types = unrecognized;
    diagnostics.unmatched_expenses = unmatched_expenses;

    let gross_profit: Months = std::array::from_fn(|m| sales[m] - cogs[m]);
    let operating_expense_total: Months =
        std::array::from_fn(|m| expense_rows.iter().map(|r| r.values[m]).sum());
    let ebit: Months = std::array::from_fn(|m| gross_profit[m] - operating_expense_total[m]);
    let net_earnings = ebit;

    let totals = PnlTotals {
        sales: row_total(&sales),
        cogs: row_total(&cogs),
        gross_profit: row_total(&gross_profit),
        expense_rows: expense_rows
            .iter()
            .map(|r| (r.category.clone(), r.total()))
            .collect(),
        operating_expense_total: row_total(&operating_expense_total),
        ebit: row_total(&ebit),
        net_earnings: row_total(&net_earnings),
    };

    if diagnostics.unmatched_expenses > 0 || !diagnostics.unrecognized_invoice_types.is_empty() {
        tracing::warn!(
            year,
            unmatched_expenses = diagnostics.unmatched_expenses,
            unrecognized_invoice_types = diagnostics.unrecognized_invoice_types.len(),
            "profit and loss used fallback categories"
        );
    }
    tracing::debug!(year, net = totals.net_earnings, rows = expense_rows.len(), "calculated profit and loss");

    PnlTable {
        year,
        months: months_of_year(year),
        sales,
        cogs,
        gross_profit,
        expense_rows,
        operating_expense_total,
        ebit,
        net_earnings,
        totals,
        diagnostics,
    }
}

// ---------------------------------------------------------------------------
// Drill-down
// ---------------------------------------------------------------------------

/// A P&L row whose cells are backed by raw records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PnlRow {
    Sales,
    Cogs,
    Expense(PnlCategory),
}

/// One raw record supporting a P&L cell.
#[derive(Debug, Clone)]
pub enum Contribution<'a> {
    Sale(&'a SaleEntry),
    Invoice { invoice: &'a Invoice, total: f64 },
    Expense(&'a OtherExpense),
}

impl Contribution<'_> {
    pub fn id(&self) -> &str {
        match self {
            Contribution::Sale(s) => &s.id,
            Contribution::Invoice { invoice, .. } => &invoice.id,
            Contribution::Expense(e) => &e.id,
        }
    }

    pub fn date(&self) -> &str {
        match self {
            Contribution::Sale(s) => &s.date,
            Contribution::Invoice { invoice, .. } => &invoice.invoice_date,
            Contribution::Expense(e) => &e.date,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Contribution::Sale(s) => s.description.clone(),
            Contribution::Invoice { invoice, .. } => {
                format!("Invoice {} ({})", invoice.invoice_number, invoice.invoice_type)
            }
            Contribution::Expense(e) => e.description.clone(),
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            Contribution::Sale(s) => coerce_amount(s.amount),
            Contribution::Invoice { total, .. } => *total,
            Contribution::Expense(e) => coerce_amount(e.amount),
        }
    }
}

/// Every record that contributed to the cell at (`month`, `row`) of the
/// `year` P&L. `month` is 1–12. Amounts sum to the cell value.
pub fn drill_down<'a>(
    snapshot: &'a LedgerSnapshot,
    year: i32,
    month: u32,
    row: &PnlRow,
) -> Vec<Contribution<'a>> {
    if !(1..=12).contains(&month) {
        return Vec::new();
    }
    let slot = month as usize - 1;
    let in_cell = |date: &str| slot_in_year(date, year) == Some(slot);

    match row {
        PnlRow::Sales => snapshot
            .sales
            .iter()
            .filter(|s| in_cell(&s.date))
            .map(Contribution::Sale)
            .collect(),
        PnlRow::Cogs | PnlRow::Expense(PnlCategory::InvoiceExpenses) => {
            let want_product = matches!(row, PnlRow::Cogs);
            snapshot
                .invoices
                .iter()
                .filter(|i| i.is_product() == want_product && in_cell(&i.invoice_date))
                .map(|invoice| Contribution::Invoice {
                    invoice,
                    total: invoice_total(&invoice.items),
                })
                .collect()
        }
        PnlRow::Expense(category) => {
            let catalog = Catalog::new(snapshot);
            snapshot
                .expenses
                .iter()
                .filter(|e| in_cell(&e.date) && &catalog.category_of(e) == category)
                .map(Contribution::Expense)
                .collect()
        }
    }
}
