//! Current-user identity as reported by the Entity Store.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Superadmin,
    Owner,
    Admin,
    Employee,
    Client,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Agency (tenant) the user belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tenant {
    pub id: Option<i64>,
    pub name: String,
    pub subdomain: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserProfile {
    pub id: Option<i64>,
    pub username: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub tenant: Option<Tenant>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
