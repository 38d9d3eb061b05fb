//! Data-quality checks over a ledger snapshot.
//!
//! Reports never fail on bad data: unreadable dates go to the "Unknown"
//! bucket, unreadable amounts count as zero, dangling expense types land in
//! "Other". This module lists every record that took one of those paths.

use std::fmt;

use crate::dates::{is_canonical_date, parse_date};
use crate::models::{Invoice, LedgerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecordKind {
    Sale,
    Invoice,
    Expense,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Sale => "sale",
            RecordKind::Invoice => "invoice",
            RecordKind::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Problem {
    /// Bucketed as "Unknown" and left out of yearly reports.
    UnreadableDate(String),
    /// Readable but not zero-padded `YYYY-MM-DD`.
    NonCanonicalDate(String),
    /// Counted as zero.
    MissingAmount,
    NegativeAmount(f64),
    /// Line item number (1-based) whose quantity was defaulted or zeroed.
    BadQuantity(usize),
    /// Line item number (1-based) whose price was counted as zero.
    BadUnitPrice(usize),
    /// Booked under "Other".
    DanglingExpenseType(Option<String>),
    /// Not "product" or "service"; booked as an operating expense.
    UnrecognizedInvoiceType(String),
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::UnreadableDate(d) if d.trim().is_empty() => write!(f, "missing date"),
            Problem::UnreadableDate(d) => write!(f, "unreadable date {d:?}"),
            Problem::NonCanonicalDate(d) => write!(f, "date {d:?} is not YYYY-MM-DD"),
            Problem::MissingAmount => write!(f, "missing or non-numeric amount"),
            Problem::NegativeAmount(v) => write!(f, "negative amount {v:.2}"),
            Problem::BadQuantity(n) => write!(f, "line {n}: invalid quantity"),
            Problem::BadUnitPrice(n) => write!(f, "line {n}: invalid unit price"),
            Problem::DanglingExpenseType(Some(id)) => write!(f, "unknown expense type {id:?}"),
            Problem::DanglingExpenseType(None) => write!(f, "no expense type"),
            Problem::UnrecognizedInvoiceType(t) => write!(f, "unrecognized invoice type {t:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub kind: RecordKind,
    pub id: String,
    pub problem: Problem,
}

#[derive(Debug, Default)]
pub struct AuditReport {
    pub findings: Vec<Finding>,
    pub records_checked: usize,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Records that reports bucket under "Unknown".
    pub fn unknown_bucketed(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| matches!(f.problem, Problem::UnreadableDate(_)))
            .count()
    }

    /// Records whose amount (or a line of which) was counted as zero.
    pub fn zero_coerced(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| matches!(f.problem, Problem::MissingAmount | Problem::BadUnitPrice(_)))
            .count()
    }

    fn push(&mut self, kind: RecordKind, id: &str, problem: Problem) {
        self.findings.push(Finding {
            kind,
            id: id.to_string(),
            problem,
        });
    }

    fn check_date(&mut self, kind: RecordKind, id: &str, date: &str) {
        if parse_date(date).is_none() {
            self.push(kind, id, Problem::UnreadableDate(date.to_string()));
        } else if !is_canonical_date(date) {
            self.push(kind, id, Problem::NonCanonicalDate(date.to_string()));
        }
    }

    fn check_amount(&mut self, kind: RecordKind, id: &str, amount: Option<f64>) {
        match amount.filter(|v| v.is_finite()) {
            None => self.push(kind, id, Problem::MissingAmount),
            Some(v) if v < 0.0 => self.push(kind, id, Problem::NegativeAmount(v)),
            Some(_) => {}
        }
    }

    fn check_invoice(&mut self, invoice: &Invoice) {
        let id = invoice.id.as_str();
        self.check_date(RecordKind::Invoice, id, &invoice.invoice_date);
        for (n, item) in invoice.items.iter().enumerate() {
            let valid_qty = item.quantity.is_some_and(|q| q.is_finite() && q >= 1.0 && q.fract() == 0.0);
            if !valid_qty {
                self.push(RecordKind::Invoice, id, Problem::BadQuantity(n + 1));
            }
            if !item.unit_price.is_some_and(|p| p.is_finite() && p >= 0.0) {
                self.push(RecordKind::Invoice, id, Problem::BadUnitPrice(n + 1));
            }
        }
        let kind = invoice.invoice_type.trim().to_lowercase();
        if kind != "product" && kind != "service" {
            self.push(
                RecordKind::Invoice,
                id,
                Problem::UnrecognizedInvoiceType(invoice.invoice_type.clone()),
            );
        }
    }
}

pub fn audit(snapshot: &LedgerSnapshot) -> AuditReport {
    let mut report = AuditReport::default();

    for sale in &snapshot.sales {
        report.check_date(RecordKind::Sale, &sale.id, &sale.date);
        report.check_amount(RecordKind::Sale, &sale.id, sale.amount);
    }
    for invoice in &snapshot.invoices {
        report.check_invoice(invoice);
    }
    for expense in &snapshot.expenses {
        report.check_date(RecordKind::Expense, &expense.id, &expense.date);
        report.check_amount(RecordKind::Expense, &expense.id, expense.amount);
        let resolves = expense
            .type_id
            .as_deref()
            .is_some_and(|id| snapshot.expense_type(id).is_some());
        if !resolves {
            report.push(
                RecordKind::Expense,
                &expense.id,
                Problem::DanglingExpenseType(expense.type_id.clone()),
            );
        }
    }

    report.records_checked = snapshot.sales.len() + snapshot.invoices.len() + snapshot.expenses.len();
    if !report.is_clean() {
        tracing::info!(
            findings = report.findings.len(),
            checked = report.records_checked,
            "ledger audit found data-quality problems"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseType, LineItem, OtherExpense, PaymentMethod, SaleEntry, SaleType};

    fn problems_for<'a>(report: &'a AuditReport, id: &str) -> Vec<&'a Problem> {
        report.findings.iter().filter(|f| f.id == id).map(|f| &f.problem).collect()
    }

    fn ledger() -> LedgerSnapshot {
        let sale = |id: &str, date: &str, amount: Option<f64>| SaleEntry {
            id: id.into(),
            date: date.into(),
            sale_type: SaleType::Fiscal,
            description: String::new(),
            amount,
            created_at: String::new(),
        };
        let expense = |id: &str, type_id: Option<&str>| OtherExpense {
            id: id.into(),
            date: "2024-04-01".into(),
            type_id: type_id.map(Into::into),
            description: String::new(),
            amount: Some(10.0),
            payment_method: PaymentMethod::Cash,
            payment_date: String::new(),
        };
        LedgerSnapshot {
            sales: vec![
                sale("ok", "2024-01-01", Some(10.0)),
                sale("undated", "", Some(10.0)),
                sale("sloppy", "2024-1-5", None),
                sale("refund", "2024-01-02", Some(-3.0)),
            ],
            invoices: vec![Invoice {
                id: "inv".into(),
                seller_id: None,
                invoice_number: "1".into(),
                documented_date: String::new(),
                invoice_date: "2024-05-05".into(),
                invoice_type: "prodcut".into(),
                items: vec![
                    LineItem { item_id: None, quantity: Some(2.0), unit_price: Some(5.0) },
                    LineItem { item_id: None, quantity: None, unit_price: Some(-1.0) },
                ],
                payment_method: PaymentMethod::None,
                payment_date: String::new(),
            }],
            expenses: vec![expense("known", Some("rent")), expense("dangling", Some("nope")), expense("untyped", None)],
            expense_types: vec![ExpenseType { id: "rent".into(), name: "Rent".into() }],
        }
    }

    #[test]
    fn test_clean_records_have_no_findings() {
        let report = audit(&ledger());
        assert!(problems_for(&report, "ok").is_empty());
        assert!(problems_for(&report, "known").is_empty());
        assert_eq!(report.records_checked, 8);
    }

    #[test]
    fn test_date_and_amount_problems() {
        let report = audit(&ledger());
        assert_eq!(problems_for(&report, "undated"), vec![&Problem::UnreadableDate(String::new())]);
        assert_eq!(
            problems_for(&report, "sloppy"),
            vec![&Problem::NonCanonicalDate("2024-1-5".into()), &Problem::MissingAmount]
        );
        assert_eq!(problems_for(&report, "refund"), vec![&Problem::NegativeAmount(-3.0)]);
        assert_eq!(report.unknown_bucketed(), 1);
    }

    #[test]
    fn test_invoice_problems() {
        let report = audit(&ledger());
        assert_eq!(
            problems_for(&report, "inv"),
            vec![
                &Problem::BadQuantity(2),
                &Problem::BadUnitPrice(2),
                &Problem::UnrecognizedInvoiceType("prodcut".into()),
            ]
        );
        assert_eq!(report.zero_coerced(), 2);
    }

    #[test]
    fn test_dangling_expense_types() {
        let report = audit(&ledger());
        assert_eq!(
            problems_for(&report, "dangling"),
            vec![&Problem::DanglingExpenseType(Some("nope".into()))]
        );
        assert_eq!(problems_for(&report, "untyped"), vec![&Problem::DanglingExpenseType(None)]);
    }

    #[test]
    fn test_problem_display() {
        assert_eq!(Problem::UnreadableDate(String::new()).to_string(), "missing date");
        assert_eq!(Problem::BadQuantity(3).to_string(), "line 3: invalid quantity");
    }
}
