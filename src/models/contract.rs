//! Lease and sale contracts between a property and a client.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Active,
    Expired,
    Terminated,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Contract {
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub property: Option<i64>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub client: Option<i64>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub end_date: Option<NaiveDate>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub monthly_amount: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub total_amount: Option<Decimal>,
    #[serde(deserialize_with = "crate::models::lenient::or_default")]
    pub status: ContractStatus,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub pdf_file: Option<String>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub notes: Option<String>,
}

impl Contract {
    pub fn is_active(&self) -> bool {
        self.status == ContractStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_decoding() {
        let active: Contract = serde_json::from_value(json!({ "status": "ACTIVE" })).unwrap();
        let odd: Contract = serde_json::from_value(json!({ "status": "ON_HOLD" })).unwrap();
        assert!(active.is_active());
        assert_eq!(odd.status, ContractStatus::Unknown);
        assert!(!odd.is_active());
    }

    #[test]
    fn decodes_dates_and_amounts() {
        let contract: Contract = serde_json::from_value(json!({
            "id": 11,
            "property": 4,
            "client": 2,
            "start_date": "2026-01-01",
            "end_date": "2026-12-31",
            "monthly_amount": "4500.00",
            "total_amount": 54000,
            "status": "EXPIRED",
            "pdf_file": "http://store.local/media/contracts/11.pdf"
        }))
        .unwrap();

        assert_eq!(contract.start_date, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(contract.total_amount, Some(Decimal::from(54000)));
        assert_eq!(contract.status, ContractStatus::Expired);
    }
}
