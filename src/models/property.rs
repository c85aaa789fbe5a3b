//! Property listing as returned by the Entity Store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    Apartment,
    Villa,
    Office,
    Shop,
    Land,
    /// Missing or unrecognized type. Still counted in the distribution.
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "crate::models::lenient::or_default")]
    pub title: String,
    #[serde(deserialize_with = "crate::models::lenient::or_default")]
    pub property_type: PropertyType,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub price: Option<Decimal>,
    /// Area in square meters.
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub area: Option<Decimal>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub city: Option<String>,
    #[serde(alias = "location")]
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub address: Option<String>,
    #[serde(alias = "image")]
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub main_image: Option<String>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub description: Option<String>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_rest_framework_shape() {
        let property: Property = serde_json::from_value(json!({
            "id": 7,
            "title": "Corniche Tower 12B",
            "property_type": "APARTMENT",
            "area": "140.50",
            "location": "Jeddah, Corniche Rd",
            "price": "950000.00",
            "image": null,
            "tenant": 1
        }))
        .unwrap();

        assert_eq!(property.id, Some(7));
        assert_eq!(property.property_type, PropertyType::Apartment);
        assert_eq!(property.price, Some(Decimal::new(95000000, 2)));
        assert_eq!(property.address.as_deref(), Some("Jeddah, Corniche Rd"));
        assert!(property.main_image.is_none());
    }

    #[test]
    fn unknown_type_is_kept() {
        let property: Property =
            serde_json::from_value(json!({ "title": "Farm", "property_type": "FARM" })).unwrap();
        assert_eq!(property.property_type, PropertyType::Unknown);

        let missing: Property = serde_json::from_value(json!({ "title": "No type" })).unwrap();
        assert_eq!(missing.property_type, PropertyType::Unknown);
    }

    #[test]
    fn serializes_money_as_numbers() {
        let property = Property {
            title: "Shop 3".to_string(),
            property_type: PropertyType::Shop,
            price: Some(Decimal::new(125050, 2)),
            ..Default::default()
        };
        let json = serde_json::to_value(&property).unwrap();
        assert_eq!(json["price"], 1250.5);
        assert_eq!(json["property_type"], "SHOP");
    }
}
