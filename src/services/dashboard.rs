//! Dashboard loading: fetch every source concurrently, then aggregate.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::AppConfig;
use crate::models::client::Client;
use crate::models::contract::{Contract, ContractStatus};
use crate::models::dashboard::DashboardStats;
use crate::models::invoice::{Invoice, InvoiceStatus};
use crate::models::property::Property;
use crate::services::aggregator::{self, AggregationOptions, DashboardInputs};
use crate::services::entity_store::{decode_records, EntityStore, Resource, StoreError};
use crate::services::session::Session;

/// Where the dashboard figures come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatsSource {
    /// Aggregate the raw entity lists locally.
    #[default]
    Compute,
    /// Use the store's stats endpoint, normalized; falls back to `Compute`.
    Precomputed,
}

impl FromStr for StatsSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compute" => Ok(Self::Compute),
            "precomputed" => Ok(Self::Precomputed),
            other => Err(format!("unknown stats source: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub source: StatsSource,
    /// Deadline for each source, paging included. A source that misses it
    /// counts as a fetch failure.
    pub source_timeout: Duration,
    pub aggregation: AggregationOptions,
}

impl DashboardOptions {
    pub fn from_config(config: &AppConfig, as_of: NaiveDate) -> Self {
        Self {
            source: config.stats_source,
            source_timeout: Duration::from_secs(config.dashboard_source_timeout_secs),
            aggregation: AggregationOptions {
                as_of,
                months: config.dashboard_months,
                overdue_policy: config.overdue_policy,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    /// A source could not be fetched; its figures are zero.
    FetchFailure,
    /// Some records of a source could not be read and were skipped.
    MalformedEntity,
    /// Some records carry a status outside the known set and were ignored.
    UnknownStatus,
    /// The precomputed stats object had missing or unreadable fields.
    MalformedStats,
}

/// Soft warning shown next to the dashboard; never blocks rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadWarning {
    pub source: &'static str,
    pub kind: WarningKind,
    pub message: String,
}

impl LoadWarning {
    fn new(source: &'static str, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            source,
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub stats: DashboardStats,
    /// Soft warning indicator: set whenever any warning was recorded.
    pub degraded: bool,
    pub warnings: Vec<LoadWarning>,
}

impl DashboardReport {
    fn new(stats: DashboardStats, warnings: Vec<LoadWarning>) -> Self {
        Self {
            stats,
            degraded: !warnings.is_empty(),
            warnings,
        }
    }
}

/// Load the dashboard for one session. Never fails: sources that cannot be
/// loaded degrade to zeroed figures plus a warning.
///
/// The four list requests run concurrently on the caller's task, so dropping
/// the returned future abandons whatever is still in flight.
pub async fn load_dashboard<S: EntityStore>(
    store: &S,
    session: &Session,
    options: &DashboardOptions,
) -> DashboardReport {
    let mut warnings = Vec::new();

    if options.source == StatsSource::Precomputed {
        match within(options.source_timeout, store.dashboard_stats(session)).await {
            Ok(value) => {
                let (stats, problems) =
                    aggregator::normalize_precomputed(&value, &options.aggregation);
                if !problems.is_empty() {
                    tracing::warn!(fields = ?problems, "Precomputed stats had defaulted fields");
                    warnings.push(LoadWarning::new(
                        "stats",
                        WarningKind::MalformedStats,
                        format!("defaulted: {}", problems.join(", ")),
                    ));
                }
                return DashboardReport::new(stats, warnings);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Precomputed stats unavailable, aggregating locally");
                warnings.push(LoadWarning::new(
                    "stats",
                    WarningKind::FetchFailure,
                    e.to_string(),
                ));
            }
        }
    }

    let (properties, clients, contracts, invoices) = tokio::join!(
        fetch_source::<S, Property>(store, session, Resource::Properties, options.source_timeout),
        fetch_source::<S, Client>(store, session, Resource::Clients, options.source_timeout),
        fetch_source::<S, Contract>(store, session, Resource::Contracts, options.source_timeout),
        fetch_source::<S, Invoice>(store, session, Resource::Invoices, options.source_timeout),
    );

    let inputs = DashboardInputs {
        properties: collect(properties, &mut warnings),
        clients: collect(clients, &mut warnings),
        contracts: collect(contracts, &mut warnings),
        invoices: collect(invoices, &mut warnings),
    };
    warn_unknown_statuses(&inputs, &mut warnings);

    let computed = aggregator::compute_stats(&inputs, &options.aggregation);
    if computed.skipped_invoices > 0 {
        tracing::warn!(skipped = computed.skipped_invoices, "Invoices left out of the financial figures");
        warnings.push(LoadWarning::new(
            Resource::Invoices.name(),
            WarningKind::MalformedEntity,
            format!(
                "{} invoice(s) had an unusable total and were left out",
                computed.skipped_invoices
            ),
        ));
    }

    let stats = computed.stats;
    tracing::info!(
        properties = stats.counts.properties,
        clients = stats.counts.clients,
        active_contracts = stats.counts.active_contracts,
        warnings = warnings.len(),
        "Dashboard computed"
    );
    DashboardReport::new(stats, warnings)
}

type Fetched<T> = (Option<Vec<T>>, Vec<LoadWarning>);

/// Failures from a store call made under a deadline.
#[derive(Debug, thiserror::Error)]
enum SourceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no answer within {0:?}")]
    TimedOut(Duration),
}

async fn within<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, SourceError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(SourceError::TimedOut(limit)),
    }
}

async fn fetch_source<S: EntityStore, T: DeserializeOwned>(
    store: &S,
    session: &Session,
    resource: Resource,
    limit: Duration,
) -> Fetched<T> {
    match within(limit, store.list(session, resource)).await {
        Ok(records) => {
            let (items, dropped) = decode_records::<T>(records);
            let mut warnings = Vec::new();
            if dropped > 0 {
                tracing::warn!(source = resource.name(), dropped, "Skipped unreadable records");
                warnings.push(LoadWarning::new(
                    resource.name(),
                    WarningKind::MalformedEntity,
                    format!("{dropped} record(s) could not be read"),
                ));
            }
            (Some(items), warnings)
        }
        Err(e) => {
            tracing::warn!(source = resource.name(), error = %e, "Dashboard source failed to load");
            (
                None,
                vec![LoadWarning::new(
                    resource.name(),
                    WarningKind::FetchFailure,
                    e.to_string(),
                )],
            )
        }
    }
}

fn collect<T>(fetched: Fetched<T>, warnings: &mut Vec<LoadWarning>) -> Option<Vec<T>> {
    let (items, mut source_warnings) = fetched;
    warnings.append(&mut source_warnings);
    items
}

fn warn_unknown_statuses(inputs: &DashboardInputs, warnings: &mut Vec<LoadWarning>) {
    let contracts = inputs
        .contracts
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .filter(|c| c.status == ContractStatus::Unknown)
        .count();
    let invoices = inputs
        .invoices
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .filter(|i| i.status == InvoiceStatus::Unknown)
        .count();

    for (source, count) in [("contracts", contracts), ("invoices", invoices)] {
        if count > 0 {
            warnings.push(LoadWarning::new(
                source,
                WarningKind::UnknownStatus,
                format!("{count} record(s) with an unrecognized status were ignored"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// In-memory store; a missing resource answers with a 503.
    #[derive(Default)]
    struct FakeStore {
        lists: HashMap<Resource, Vec<Value>>,
        stats: Option<Value>,
        slow: Option<(Resource, Duration)>,
    }

    impl FakeStore {
        fn with(mut self, resource: Resource, records: Value) -> Self {
            let Value::Array(items) = records else {
                panic!("fixture must be an array");
            };
            self.lists.insert(resource, items);
            self
        }
    }

    impl EntityStore for FakeStore {
        async fn list(&self, _session: &Session, resource: Resource) -> Result<Vec<Value>, StoreError> {
            if let Some((slow, delay)) = self.slow {
                if slow == resource {
                    tokio::time::sleep(delay).await;
                }
            }
            self.lists
                .get(&resource)
                .cloned()
                .ok_or(StoreError::Status(503))
        }

        async fn dashboard_stats(&self, _session: &Session) -> Result<Value, StoreError> {
            self.stats.clone().ok_or(StoreError::Status(404))
        }
    }

    fn options(source: StatsSource) -> DashboardOptions {
        DashboardOptions {
            source,
            source_timeout: Duration::from_secs(5),
            aggregation: AggregationOptions::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
        }
    }

    fn full_store() -> FakeStore {
        FakeStore::default()
            .with(
                Resource::Properties,
                json!([
                    { "id": 1, "title": "Villa Rawdah", "property_type": "VILLA", "price": "2100000.00" },
                    { "id": 2, "title": "Olaya Office", "property_type": "OFFICE", "price": "800000.00" }
                ]),
            )
            .with(
                Resource::Clients,
                json!([{ "id": 1, "name": "Fahad", "phone": "0500000001" }]),
            )
            .with(
                Resource::Contracts,
                json!([
                    { "id": 1, "status": "ACTIVE" },
                    { "id": 2, "status": "EXPIRED" }
                ]),
            )
            .with(
                Resource::Invoices,
                json!([
                    { "invoice_number": "INV-1", "amount": "100.00", "tax_rate": "15.00", "due_date": "2026-09-01", "status": "PAID" },
                    { "invoice_number": "INV-2", "amount": "200.00", "tax_rate": "15.00", "due_date": "2026-11-01", "status": "PENDING" }
                ]),
            )
    }

    #[test]
    fn computes_from_all_sources() {
        let store = full_store();
        let report = tokio_test::block_on(load_dashboard(
            &store,
            &Session::new("token"),
            &options(StatsSource::Compute),
        ));

        assert!(!report.degraded);
        assert!(report.warnings.is_empty());
        assert_eq!(report.stats.counts.properties, 2);
        assert_eq!(report.stats.counts.clients, 1);
        assert_eq!(report.stats.counts.active_contracts, 1);
        assert_eq!(report.stats.financial.total_revenue, Decimal::from(115));
        assert_eq!(report.stats.financial.pending_amount, Decimal::from(230));
    }

    #[test]
    fn failed_source_degrades_only_its_fields() {
        let mut store = full_store();
        store.lists.remove(&Resource::Invoices);

        let report = tokio_test::block_on(load_dashboard(
            &store,
            &Session::new("token"),
            &options(StatsSource::Compute),
        ));

        assert!(report.degraded);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].source, "invoices");
        assert_eq!(report.warnings[0].kind, WarningKind::FetchFailure);
        assert_eq!(report.stats.counts.properties, 2);
        assert_eq!(report.stats.financial.total_revenue, Decimal::ZERO);
        assert_eq!(report.stats.charts.monthly_revenue.len(), 6);
    }

    #[test]
    fn everything_failing_still_renders() {
        let report = tokio_test::block_on(load_dashboard(
            &FakeStore::default(),
            &Session::new("token"),
            &options(StatsSource::Compute),
        ));

        assert!(report.degraded);
        assert_eq!(report.warnings.len(), 4);
        assert_eq!(report.stats.counts.properties, 0);
        assert_eq!(report.stats.charts.monthly_revenue.len(), 6);
    }

    #[test]
    fn malformed_and_unknown_records_are_soft_warnings() {
        let store = full_store().with(
            Resource::Invoices,
            json!([
                { "invoice_number": "INV-1", "amount": "100.00", "status": "PAID" },
                { "invoice_number": "INV-2", "amount": "garbage", "status": "PAID" },
                { "invoice_number": "INV-3", "amount": "10.00", "status": "REFUNDED" }
            ]),
        );
        let report = tokio_test::block_on(load_dashboard(
            &store,
            &Session::new("token"),
            &options(StatsSource::Compute),
        ));

        assert!(report.degraded);
        let kinds: Vec<WarningKind> = report.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![WarningKind::MalformedEntity, WarningKind::UnknownStatus]
        );
        assert_eq!(report.stats.financial.total_revenue, Decimal::from(115));
    }

    #[test]
    fn precomputed_stats_are_normalized() {
        let store = FakeStore {
            stats: Some(json!({
                "counts": { "properties": 9, "clients": 4, "active_contracts": 3 },
                "financial": { "total_revenue": 5000.0, "pending_amount": 0, "overdue_amount": 0 },
                "charts": { "monthly_revenue": [], "property_distribution": [] }
            })),
            ..Default::default()
        };
        let report = tokio_test::block_on(load_dashboard(
            &store,
            &Session::new("token"),
            &options(StatsSource::Precomputed),
        ));

        assert!(report.warnings.is_empty());
        assert_eq!(report.stats.counts.properties, 9);
        assert_eq!(report.stats.charts.monthly_revenue.len(), 6);
    }

    #[test]
    fn precomputed_failure_falls_back_to_compute() {
        let store = full_store();
        let report = tokio_test::block_on(load_dashboard(
            &store,
            &Session::new("token"),
            &options(StatsSource::Precomputed),
        ));

        assert!(report.degraded);
        assert_eq!(report.warnings[0].source, "stats");
        assert_eq!(report.stats.counts.properties, 2);
        assert_eq!(report.stats.financial.total_revenue, Decimal::from(115));
    }

    #[test]
    fn unreadable_fields_only_affect_their_figures() {
        let store = full_store()
            .with(
                Resource::Properties,
                json!([
                    { "id": 1, "title": "Villa Rawdah", "property_type": "VILLA", "price": "n/a" },
                    { "id": 2, "title": null, "property_type": "OFFICE", "area": "large" }
                ]),
            )
            .with(
                Resource::Invoices,
                json!([
                    { "invoice_number": "INV-1", "amount": "100.00", "tax_rate": "15.00", "due_date": "not-a-date", "status": "PAID" }
                ]),
            );
        let report = tokio_test::block_on(load_dashboard(
            &store,
            &Session::new("token"),
            &options(StatsSource::Compute),
        ));

        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.stats.counts.properties, 2);
        assert_eq!(report.stats.charts.property_distribution.len(), 2);
        assert_eq!(report.stats.financial.total_revenue, Decimal::from(115));
        assert!(report
            .stats
            .charts
            .monthly_revenue
            .iter()
            .all(|m| m.revenue == Decimal::ZERO));
    }

    #[test]
    fn overflowing_invoice_is_a_soft_warning() {
        let store = full_store().with(
            Resource::Invoices,
            json!([
                { "invoice_number": "INV-1", "amount": "100.00", "tax_rate": "15.00", "status": "PAID" },
                { "invoice_number": "INV-2", "amount": "79228162514264337593543950335", "tax_rate": "15.00", "status": "PAID" }
            ]),
        );
        let report = tokio_test::block_on(load_dashboard(
            &store,
            &Session::new("token"),
            &options(StatsSource::Compute),
        ));

        assert!(report.degraded);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].source, "invoices");
        assert_eq!(report.warnings[0].kind, WarningKind::MalformedEntity);
        assert_eq!(report.stats.financial.total_revenue, Decimal::from(115));
    }

    #[tokio::test]
    async fn slow_source_times_out_into_a_warning() {
        let store = FakeStore {
            slow: Some((Resource::Clients, Duration::from_millis(500))),
            ..full_store()
        };
        let options = DashboardOptions {
            source_timeout: Duration::from_millis(50),
            ..options(StatsSource::Compute)
        };
        let report = load_dashboard(&store, &Session::new("token"), &options).await;

        assert!(report.degraded);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].source, "clients");
        assert_eq!(report.warnings[0].kind, WarningKind::FetchFailure);
        assert_eq!(report.stats.counts.clients, 0);
        assert_eq!(report.stats.counts.properties, 2);
    }

    #[test]
    fn stats_source_from_str() {
        assert_eq!(
            "precomputed".parse::<StatsSource>(),
            Ok(StatsSource::Precomputed)
        );
        assert_eq!(" Compute ".parse::<StatsSource>(), Ok(StatsSource::Compute));
        assert!("cached".parse::<StatsSource>().is_err());
    }
}
