//! Invoice records and their derived tax figures.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tax rate applied by the Entity Store when an invoice is created without one.
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "OVERDUE" => Ok(Self::Overdue),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown invoice status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Invoice {
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "crate::models::lenient::or_default")]
    pub invoice_number: String,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub contract: Option<i64>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub amount: Option<Decimal>,
    /// Percentage, e.g. `15` for 15%.
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub tax_rate: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub tax_amount: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub total_amount: Option<Decimal>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub due_date: Option<NaiveDate>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub paid_date: Option<NaiveDate>,
    #[serde(deserialize_with = "crate::models::lenient::or_default")]
    pub status: InvoiceStatus,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub pdf_file: Option<String>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// `amount * tax_rate / 100`. `None` when the amount is missing, either
    /// figure is negative, or the product overflows. A missing rate falls back
    /// to [`DEFAULT_TAX_RATE`].
    pub fn tax(&self) -> Option<Decimal> {
        let amount = self.amount?;
        let rate = self.tax_rate.unwrap_or(DEFAULT_TAX_RATE);
        if amount.is_sign_negative() || rate.is_sign_negative() {
            return None;
        }
        amount.checked_mul(rate)?.checked_div(Decimal::ONE_HUNDRED)
    }

    /// Gross amount used by every financial aggregate.
    ///
    /// Derived from `amount` and `tax_rate` whenever `amount` is present; the
    /// stored `total_amount` is only a fallback for records without it.
    pub fn total(&self) -> Option<Decimal> {
        match self.amount {
            Some(amount) => self.tax().and_then(|tax| amount.checked_add(tax)),
            None => self.total_amount.filter(|t| !t.is_sign_negative()),
        }
    }
}

/// Invoice row for list screens: stored fields plus the derived figures the
/// dashboard uses, so both views agree.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceSummary {
    pub id: Option<i64>,
    pub invoice_number: String,
    pub contract: Option<i64>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub amount: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub tax_rate: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub tax_amount: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub total_amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub effective_status: InvoiceStatus,
    pub pdf_file: Option<String>,
}

impl InvoiceSummary {
    pub fn new(invoice: Invoice, effective_status: InvoiceStatus) -> Self {
        Self {
            tax_amount: invoice.tax().or(invoice.tax_amount),
            total_amount: invoice.total(),
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            contract: invoice.contract,
            amount: invoice.amount,
            tax_rate: invoice.tax_rate,
            due_date: invoice.due_date,
            paid_date: invoice.paid_date,
            status: invoice.status,
            effective_status,
            pdf_file: invoice.pdf_file,
        }
    }
}
