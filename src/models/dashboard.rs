//! Dashboard statistics shown as cards and charts.
//!
//! Every field has a default so a response never omits a key, even when the
//! sources behind it failed to load.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::property::PropertyType;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub counts: Counts,
    pub financial: Financial,
    pub charts: Charts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Counts {
    pub properties: u64,
    pub clients: u64,
    pub active_contracts: u64,
}

/// Invoice totals per effective status. Cancelled and unknown statuses are in
/// none of the buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Financial {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_revenue: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub pending_amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub overdue_amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Charts {
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub property_distribution: Vec<PropertyTypeCount>,
}

/// Paid revenue for one calendar month, keyed `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyTypeCount {
    pub property_type: PropertyType,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_serialize_every_key() {
        let json = serde_json::to_value(DashboardStats::default()).unwrap();
        assert_eq!(json["counts"]["properties"], 0);
        assert_eq!(json["counts"]["active_contracts"], 0);
        assert_eq!(json["financial"]["total_revenue"], 0.0);
        assert_eq!(json["financial"]["overdue_amount"], 0.0);
        assert!(json["charts"]["monthly_revenue"].as_array().unwrap().is_empty());
        assert!(json["charts"]["property_distribution"].as_array().unwrap().is_empty());
    }

    #[test]
    fn monthly_entry_shape() {
        let entry = MonthlyRevenue {
            month: "2026-05".to_string(),
            revenue: Decimal::new(11500, 2),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["month"], "2026-05");
        assert_eq!(json["revenue"], 115.0);
    }
}
