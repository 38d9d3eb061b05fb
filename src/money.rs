use crate::models::LineItem;

/// Sale and expense amounts: missing or unreadable values count as zero.
/// Negative amounts pass through untouched (the audit reports them).
pub fn coerce_amount(raw: Option<f64>) -> f64 {
    raw.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Quantity is a whole number. Missing, unreadable or zero quantities mean a
/// single unit; negative ones contribute nothing.
pub fn coerce_quantity(raw: Option<f64>) -> f64 {
    match raw.filter(|v| v.is_finite()).map(f64::trunc) {
        None => 1.0,
        Some(q) if q == 0.0 => 1.0,
        Some(q) if q < 0.0 => 0.0,
        Some(q) => q,
    }
}

pub fn coerce_unit_price(raw: Option<f64>) -> f64 {
    raw.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0)
}

pub fn line_total(item: &LineItem) -> f64 {
    coerce_quantity(item.quantity) * coerce_unit_price(item.unit_price)
}

pub fn invoice_total(items: &[LineItem]) -> f64 {
    items.iter().map(line_total).sum()
}
