//! Client (tenant or buyer) records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Client {
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "crate::models::lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "crate::models::lenient::or_default")]
    pub phone: String,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub email: Option<String>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub national_id: Option<String>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "crate::models::lenient::optional")]
    pub created_at: Option<DateTime<Utc>>,
}
