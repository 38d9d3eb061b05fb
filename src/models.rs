use serde::{Deserialize, Deserializer, Serialize};

/// Fiscal sales are formally receipted; non-fiscal ones are informal cash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaleType {
    Fiscal,
    #[default]
    NonFiscal,
}

impl SaleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleType::Fiscal => "fiscal",
            SaleType::NonFiscal => "non-fiscal",
        }
    }

    /// Anything that isn't recognisably "fiscal" is treated as non-fiscal.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "fiscal" => SaleType::Fiscal,
            _ => SaleType::NonFiscal,
        }
    }
}

impl<'de> Deserialize<'de> for SaleType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(SaleType::parse_lenient(raw.as_deref().unwrap_or("")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    None,
    Cash,
    Card,
    Bank,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::None => "none",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Bank => "bank",
        }
    }

    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "cash" => PaymentMethod::Cash,
            "card" => PaymentMethod::Card,
            "bank" => PaymentMethod::Bank,
            _ => PaymentMethod::None,
        }
    }
}

impl<'de> Deserialize<'de> for PaymentMethod {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(PaymentMethod::parse_lenient(raw.as_deref().unwrap_or("")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleEntry {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(rename = "type", default)]
    pub sale_type: SaleType,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub item_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub seller_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub documented_date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_date: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub invoice_type: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_date: String,
}

impl Invoice {
    /// Product invoices are cost of goods sold; every other type is an
    /// operating expense.
    pub fn is_product(&self) -> bool {
        self.invoice_type.trim().eq_ignore_ascii_case("product")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseType {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherExpense {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub type_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_date: String,
}

/// Read-only view of the whole ledger. Every report is computed from one of
/// these, never from the database directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub sales: Vec<SaleEntry>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default, alias = "otherExpenses")]
    pub expenses: Vec<OtherExpense>,
    #[serde(default)]
    pub expense_types: Vec<ExpenseType>,
}

impl LedgerSnapshot {
    pub fn expense_type(&self, id: &str) -> Option<&ExpenseType> {
        self.expense_types.iter().find(|t| t.id == id)
    }
}

/// Accepts a JSON number, a numeric string, an empty string or null.
/// Anything non-numeric becomes `None` instead of failing the whole import.
fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

/// Ids written by older clients are sometimes numeric timestamps.
fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(lenient_opt_id(d)?.unwrap_or_default())
}

/// Null, numbers and booleans are read as text so one odd field never fails
/// the whole import. Unreadable values end up as `""`.
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_opt_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_amounts() {
        let json = r#"{"id": "s1", "date": "2024-01-15", "type": "fiscal", "amount": "12.50"}"#;
        let sale: SaleEntry = serde_json::from_str(json).unwrap();
        assert_eq!(sale.amount, Some(12.5));
        assert_eq!(sale.sale_type, SaleType::Fiscal);

        let json = r#"{"id": "s2", "type": "cash", "amount": "abc"}"#;
        let sale: SaleEntry = serde_json::from_str(json).unwrap();
        assert_eq!(sale.amount, None);
        assert_eq!(sale.sale_type, SaleType::NonFiscal);
        assert_eq!(sale.date, "");
    }

    #[test]
    fn test_invoice_defaults() {
        let json = r#"{"id": "i1", "invoiceDate": "2024-03-01", "type": "Product",
            "items": [{"quantity": null, "unitPrice": 9.99}], "paymentMethod": "wire"}"#;
        let inv: Invoice = serde_json::from_str(json).unwrap();
        assert!(inv.is_product());
        assert_eq!(inv.items[0].quantity, None);
        assert_eq!(inv.payment_method, PaymentMethod::None);
    }

    #[test]
    fn test_snapshot_accepts_other_expenses_alias() {
        let json = r#"{"otherExpenses": [{"id": "e1", "date": "2024-02-01", "typeId": "rent", "amount": 50}]}"#;
        let snap: LedgerSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.expenses.len(), 1);
        assert_eq!(snap.expenses[0].type_id.as_deref(), Some("rent"));
    }

    #[test]
    fn test_numeric_ids_become_strings() {
        let json = r#"{"id": 1700000000000, "date": "2024-02-01", "typeId": 7, "amount": 5}"#;
        let exp: OtherExpense = serde_json::from_str(json).unwrap();
        assert_eq!(exp.id, "1700000000000");
        assert_eq!(exp.type_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_null_and_missing_fields_do_not_fail() {
        let json = r#"{"date": null, "type": "fiscal", "description": 42, "amount": 5}"#;
        let sale: SaleEntry = serde_json::from_str(json).unwrap();
        assert_eq!(sale.id, "");
        assert_eq!(sale.date, "");
        assert_eq!(sale.description, "42");

        let json = r#"{"id": null, "invoiceDate": null, "type": null, "items": []}"#;
        let inv: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(inv.id, "");
        assert_eq!(inv.invoice_date, "");
        assert!(!inv.is_product());
    }
}
