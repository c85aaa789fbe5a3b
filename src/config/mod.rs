use std::env;

use crate::services::aggregator::{OverduePolicy, DEFAULT_MONTHS, MAX_MONTHS};
use crate::services::dashboard::StatsSource;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub entity_store_url: String,
    pub entity_store_timeout_secs: u64,
    pub entity_store_max_pages: usize,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub dashboard_months: u32,
    pub dashboard_source_timeout_secs: u64,
    pub overdue_policy: OverduePolicy,
    pub stats_source: StatsSource,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            entity_store_url: env::var("ENTITY_STORE_URL")?,
            entity_store_timeout_secs: env::var("ENTITY_STORE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            entity_store_max_pages: env::var("ENTITY_STORE_MAX_PAGES")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("BACKEND_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            dashboard_months: parse_months(env::var("DASHBOARD_MONTHS").ok().as_deref()),
            dashboard_source_timeout_secs: env::var("DASHBOARD_SOURCE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .unwrap_or(30),
            overdue_policy: env::var("OVERDUE_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            stats_source: env::var("STATS_SOURCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        })
    }
}

/// Chart length in months: `1..=MAX_MONTHS`, anything else falls back to the
/// default.
fn parse_months(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse().ok())
        .filter(|m| (1..=MAX_MONTHS).contains(m))
        .unwrap_or(DEFAULT_MONTHS)
}
