use std::collections::BTreeMap;

use crate::dates::DateRange;
use crate::models::{LedgerSnapshot, PaymentMethod, SaleType};
use crate::money::{coerce_amount, invoice_total};
use crate::series::{aggregate_by_month, aggregate_total, align, count_by, AlignedSeries};

pub struct DashboardTotals {
    pub fiscal_sales: f64,
    pub non_fiscal_sales: f64,
    pub total_sales: f64,
    pub purchases: f64,
    pub other_expenses: f64,
    pub net: f64,
}

pub struct Dashboard {
    pub totals: DashboardTotals,
    /// The `CASHFLOW_SERIES` columns, in order, over one shared month axis.
    pub cashflow: AlignedSeries,
    /// Invoices and expenses together, by how they were paid.
    pub payment_methods: BTreeMap<PaymentMethod, usize>,
}

pub const CASHFLOW_SERIES: [&str; 4] = ["Fiscal Sales", "Non-fiscal Sales", "Purchases", "Other Expenses"];

pub fn build_dashboard(snapshot: &LedgerSnapshot, range: &DateRange) -> Dashboard {
    let sales_by_type = aggregate_by_month(
        &snapshot.sales,
        |s| s.date.as_str(),
        |s| coerce_amount(s.amount),
        |s| s.sale_type,
        range,
    );
    let purchases = aggregate_total(
        &snapshot.invoices,
        |i| i.invoice_date.as_str(),
        |i| invoice_total(&i.items),
        range,
    );
    let expenses = aggregate_total(
        &snapshot.expenses,
        |e| e.date.as_str(),
        |e| coerce_amount(e.amount),
        range,
    );

    let fiscal = sales_by_type.get(&SaleType::Fiscal).cloned().unwrap_or_default();
    let non_fiscal = sales_by_type.get(&SaleType::NonFiscal).cloned().unwrap_or_default();
    let cashflow = align(&[fiscal.clone(), non_fiscal.clone(), purchases.clone(), expenses.clone()]);

    let mut payment_methods = count_by(
        snapshot.invoices.iter().filter(|i| range.contains(&i.invoice_date)),
        |i| i.payment_method,
    );
    for (method, n) in count_by(
        snapshot.expenses.iter().filter(|e| range.contains(&e.date)),
        |e| e.payment_method,
    ) {
        *payment_methods.entry(method).or_insert(0) += n;
    }

    let fiscal_sales = fiscal.total();
    let non_fiscal_sales = non_fiscal.total();
    let total_sales = fiscal_sales + non_fiscal_sales;
    let totals = DashboardTotals {
        fiscal_sales,
        non_fiscal_sales,
        total_sales,
        purchases: purchases.total(),
        other_expenses: expenses.total(),
        net: total_sales - purchases.total() - expenses.total(),
    };
    tracing::debug!(months = cashflow.labels.len(), net = totals.net, "built dashboard");

    Dashboard {
        totals,
        cashflow,
        payment_methods,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::MonthKey;
    use crate::models::{Invoice, LineItem, OtherExpense, SaleEntry};

    fn ledger() -> LedgerSnapshot {
        let sale = |id: &str, date: &str, t: SaleType, amount: f64| SaleEntry {
            id: id.into(),
            date: date.into(),
            sale_type: t,
            description: String::new(),
            amount: Some(amount),
            created_at: String::new(),
        };
        LedgerSnapshot {
            sales: vec![
                sale("s1", "2024-01-10", SaleType::Fiscal, 100.0),
                sale("s2", "2024-02-10", SaleType::NonFiscal, 40.0),
                sale("s3", "", SaleType::Fiscal, 5.0),
            ],
            invoices: vec![Invoice {
                id: "i1".into(),
                seller_id: Some("acme".into()),
                invoice_number: "A-1".into(),
                documented_date: "2024-03-01".into(),
                invoice_date: "2024-03-01".into(),
                invoice_type: "product".into(),
                items: vec![LineItem {
                    item_id: None,
                    quantity: Some(3.0),
                    unit_price: Some(10.0),
                }],
                payment_method: PaymentMethod::Card,
                payment_date: "2024-03-02".into(),
            }],
            expenses: vec![OtherExpense {
                id: "e1".into(),
                date: "2024-01-31".into(),
                type_id: Some("rent".into()),
                description: "January rent".into(),
                amount: Some(20.0),
                payment_method: PaymentMethod::Bank,
                payment_date: String::new(),
            }],
            expense_types: Vec::new(),
        }
    }

    #[test]
    fn test_dashboard_totals() {
        let d = build_dashboard(&ledger(), &DateRange::unbounded());
        assert_eq!(d.totals.fiscal_sales, 105.0);
        assert_eq!(d.totals.non_fiscal_sales, 40.0);
        assert_eq!(d.totals.purchases, 30.0);
        assert_eq!(d.totals.other_expenses, 20.0);
        assert_eq!(d.totals.net, 95.0);
    }

    #[test]
    fn test_undated_sale_shows_as_unknown() {
        let d = build_dashboard(&ledger(), &DateRange::unbounded());
        assert_eq!(d.cashflow.labels.last(), Some(&MonthKey::Unknown));
        let fiscal = &d.cashflow.values[0];
        assert_eq!(fiscal.last(), Some(&5.0));
    }

    #[test]
    fn test_cashflow_is_aligned() {
        let d = build_dashboard(&ledger(), &DateRange::unbounded());
        assert_eq!(d.cashflow.values.len(), CASHFLOW_SERIES.len());
        for values in &d.cashflow.values {
            assert_eq!(values.len(), d.cashflow.labels.len());
        }
        // Purchases only in March.
        assert_eq!(d.cashflow.values[2], vec![0.0, 0.0, 30.0, 0.0]);
    }

    #[test]
    fn test_range_limits_everything() {
        let range = DateRange::parse(Some("2024-02-01"), Some("2024-03-31")).unwrap();
        let d = build_dashboard(&ledger(), &range);
        assert_eq!(d.totals.fiscal_sales, 0.0);
        assert_eq!(d.totals.non_fiscal_sales, 40.0);
        assert_eq!(d.totals.other_expenses, 0.0);
        assert_eq!(d.payment_methods.get(&PaymentMethod::Card), Some(&1));
        assert_eq!(d.payment_methods.get(&PaymentMethod::Bank), None);
    }
}
