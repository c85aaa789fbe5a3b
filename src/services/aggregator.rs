//! Dashboard statistics aggregation.
//!
//! Turns raw entity collections into the cards and chart series of the
//! dashboard. Everything here is a pure function of its inputs; the current
//! date enters only through [`AggregationOptions::as_of`].

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::models::client::Client;
use crate::models::contract::Contract;
use crate::models::dashboard::{
    Charts, Counts, DashboardStats, Financial, MonthlyRevenue, PropertyTypeCount,
};
use crate::models::invoice::{Invoice, InvoiceStatus};
use crate::models::property::{Property, PropertyType};

/// Length of the monthly revenue chart.
pub const DEFAULT_MONTHS: u32 = 6;

/// Longest monthly revenue chart accepted from configuration.
pub const MAX_MONTHS: u32 = 120;

/// Where the OVERDUE classification comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverduePolicy {
    /// A PENDING invoice whose due date has passed counts as OVERDUE.
    #[default]
    DueDate,
    /// Trust the persisted status as-is.
    Stored,
}

impl FromStr for OverduePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "due_date" | "computed" => Ok(Self::DueDate),
            "stored" | "server" => Ok(Self::Stored),
            other => Err(format!("unknown overdue policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationOptions {
    pub as_of: NaiveDate,
    pub months: u32,
    pub overdue_policy: OverduePolicy,
}

impl AggregationOptions {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            months: DEFAULT_MONTHS,
            overdue_policy: OverduePolicy::default(),
        }
    }
}

/// Entity collections feeding the dashboard. `None` marks a source that
/// failed to load; only the figures derived from it are zeroed.
#[derive(Debug, Clone, Default)]
pub struct DashboardInputs {
    pub properties: Option<Vec<Property>>,
    pub clients: Option<Vec<Client>>,
    pub contracts: Option<Vec<Contract>>,
    pub invoices: Option<Vec<Invoice>>,
}

/// Status used for aggregation, after due-date reclassification.
pub fn classify_invoice_status(
    invoice: &Invoice,
    as_of: NaiveDate,
    policy: OverduePolicy,
) -> InvoiceStatus {
    match (policy, invoice.status, invoice.due_date) {
        (OverduePolicy::DueDate, InvoiceStatus::Pending, Some(due)) if due < as_of => {
            InvoiceStatus::Overdue
        }
        (_, status, _) => status,
    }
}

/// Result of [`compute_stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStats {
    pub stats: DashboardStats,
    /// Invoices left out of the financial figures because their total could
    /// not be derived or would overflow a bucket.
    pub skipped_invoices: usize,
}

/// Compute the full dashboard from the current entity snapshot.
pub fn compute_stats(inputs: &DashboardInputs, options: &AggregationOptions) -> ComputedStats {
    let properties = inputs.properties.as_deref().unwrap_or(&[]);
    let invoices = inputs.invoices.as_deref().unwrap_or(&[]);

    let counts = Counts {
        properties: properties.len() as u64,
        clients: inputs.clients.as_ref().map_or(0, |c| c.len() as u64),
        active_contracts: inputs
            .contracts
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter(|c| c.is_active())
            .count() as u64,
    };

    let (financial, skipped_invoices) = summarize_invoices(invoices, options);
    ComputedStats {
        stats: DashboardStats {
            counts,
            financial,
            charts: Charts {
                monthly_revenue: monthly_revenue(invoices, options),
                property_distribution: property_distribution(properties),
            },
        },
        skipped_invoices,
    }
}

/// Sum invoice totals into the paid, pending and overdue buckets. Returns the
/// number of bucketed invoices that had to be skipped.
fn summarize_invoices(invoices: &[Invoice], options: &AggregationOptions) -> (Financial, usize) {
    let mut financial = Financial::default();
    let mut skipped = 0;
    for invoice in invoices {
        let bucket = match classify_invoice_status(invoice, options.as_of, options.overdue_policy) {
            InvoiceStatus::Paid => &mut financial.total_revenue,
            InvoiceStatus::Pending => &mut financial.pending_amount,
            InvoiceStatus::Overdue => &mut financial.overdue_amount,
            InvoiceStatus::Cancelled | InvoiceStatus::Unknown => continue,
        };
        if !invoice.total().is_some_and(|total| add_checked(bucket, total)) {
            skipped += 1;
        }
    }
    (financial, skipped)
}

/// Add `amount` into `acc` unless the sum overflows.
fn add_checked(acc: &mut Decimal, amount: Decimal) -> bool {
    match acc.checked_add(amount) {
        Some(sum) => {
            *acc = sum;
            true
        }
        None => false,
    }
}

/// Paid revenue per due-date month over the lookback window, zero-filled.
fn monthly_revenue(invoices: &[Invoice], options: &AggregationOptions) -> Vec<MonthlyRevenue> {
    let mut buckets: HashMap<(i32, u32), Decimal> = HashMap::new();
    for invoice in invoices {
        if classify_invoice_status(invoice, options.as_of, options.overdue_policy)
            != InvoiceStatus::Paid
        {
            continue;
        }
        let (Some(due), Some(total)) = (invoice.due_date, invoice.total()) else {
            continue;
        };
        if !add_checked(buckets.entry((due.year(), due.month())).or_default(), total) {
            tracing::warn!(invoice = %invoice.invoice_number, "Monthly revenue overflowed, invoice left out of the chart");
        }
    }
    fill_window(&buckets, options)
}

fn fill_window(
    buckets: &HashMap<(i32, u32), Decimal>,
    options: &AggregationOptions,
) -> Vec<MonthlyRevenue> {
    month_window(options.as_of, options.months)
        .into_iter()
        .map(|key| MonthlyRevenue {
            month: month_key(key),
            revenue: buckets.get(&key).copied().unwrap_or(Decimal::ZERO),
        })
        .collect()
}

/// Property count per type, largest first. Ties keep first-seen order.
fn property_distribution(properties: &[Property]) -> Vec<PropertyTypeCount> {
    let mut seen: Vec<PropertyTypeCount> = Vec::new();
    for property in properties {
        // one per property, bounded by the slice length
        bump(&mut seen, property.property_type, 1);
    }
    sort_distribution(seen)
}

/// Add `count` to the entry for `property_type`. False when the count would
/// overflow; the entry is left unchanged.
fn bump(seen: &mut Vec<PropertyTypeCount>, property_type: PropertyType, count: u64) -> bool {
    match seen.iter_mut().find(|e| e.property_type == property_type) {
        Some(entry) => match entry.count.checked_add(count) {
            Some(sum) => {
                entry.count = sum;
                true
            }
            None => false,
        },
        None => {
            seen.push(PropertyTypeCount {
                property_type,
                count,
            });
            true
        }
    }
}

fn sort_distribution(mut entries: Vec<PropertyTypeCount>) -> Vec<PropertyTypeCount> {
    // stable: equal counts stay in first-seen order
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

/// The `months` calendar months ending with `as_of`'s month, oldest first.
/// `months` is capped at [`MAX_MONTHS`].
pub fn month_window(as_of: NaiveDate, months: u32) -> Vec<(i32, u32)> {
    let anchor = as_of.year() * 12 + as_of.month0() as i32;
    (0..months.min(MAX_MONTHS) as i32)
        .rev()
        .map(|back| {
            let index = anchor - back;
            (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
        })
        .collect()
}

fn month_key((year, month): (i32, u32)) -> String {
    format!("{year:04}-{month:02}")
}

fn parse_month_key(raw: &str) -> Option<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d").ok()?;
    Some((date.year(), date.month()))
}

/// Bring a precomputed stats object to the same guaranteed shape as
/// [`compute_stats`] output.
///
/// Returns the normalized stats and the paths of fields that were missing or
/// unreadable and had to be defaulted.
pub fn normalize_precomputed(
    value: &Value,
    options: &AggregationOptions,
) -> (DashboardStats, Vec<String>) {
    let mut problems = Vec::new();
    if !value.is_object() {
        problems.push("$".to_string());
    }

    let counts = Counts {
        properties: read_count(value, &["counts", "properties"], &mut problems),
        clients: read_count(value, &["counts", "clients"], &mut problems),
        active_contracts: read_count(value, &["counts", "active_contracts"], &mut problems),
    };

    let financial = Financial {
        total_revenue: read_money(value, &["financial", "total_revenue"], &mut problems),
        pending_amount: read_money(value, &["financial", "pending_amount"], &mut problems),
        overdue_amount: read_money(value, &["financial", "overdue_amount"], &mut problems),
    };

    let mut buckets: HashMap<(i32, u32), Decimal> = HashMap::new();
    for (i, entry) in read_array(value, &["charts", "monthly_revenue"], &mut problems)
        .iter()
        .enumerate()
    {
        let key = entry.get("month").and_then(Value::as_str).and_then(parse_month_key);
        let revenue = entry.get("revenue").and_then(money);
        let added = match (key, revenue) {
            (Some(key), Some(revenue)) => add_checked(buckets.entry(key).or_default(), revenue),
            _ => false,
        };
        if !added {
            problems.push(format!("charts.monthly_revenue[{i}]"));
        }
    }

    let mut seen: Vec<PropertyTypeCount> = Vec::new();
    for (i, entry) in read_array(value, &["charts", "property_distribution"], &mut problems)
        .iter()
        .enumerate()
    {
        let property_type = entry
            .get("property_type")
            .map(|t| serde_json::from_value::<PropertyType>(t.clone()).unwrap_or_default());
        let added = match (property_type, entry.get("count").and_then(count)) {
            (Some(property_type), Some(n)) => bump(&mut seen, property_type, n),
            _ => false,
        };
        if !added {
            problems.push(format!("charts.property_distribution[{i}]"));
        }
    }

    let stats = DashboardStats {
        counts,
        financial,
        charts: Charts {
            monthly_revenue: fill_window(&buckets, options),
            property_distribution: sort_distribution(seen),
        },
    };
    (stats, problems)
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(*key))
}

fn read_count(value: &Value, path: &[&str], problems: &mut Vec<String>) -> u64 {
    match lookup(value, path).and_then(count) {
        Some(n) => n,
        None => {
            problems.push(path.join("."));
            0
        }
    }
}

fn read_money(value: &Value, path: &[&str], problems: &mut Vec<String>) -> Decimal {
    match lookup(value, path).and_then(money) {
        Some(amount) => amount,
        None => {
            problems.push(path.join("."));
            Decimal::ZERO
        }
    }
}

fn read_array<'a>(value: &'a Value, path: &[&str], problems: &mut Vec<String>) -> &'a [Value] {
    match lookup(value, path).and_then(Value::as_array) {
        Some(items) => items,
        None => {
            problems.push(path.join("."));
            &[]
        }
    }
}

/// Non-negative integer from a JSON number or numeric string.
fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-negative amount from a JSON number or decimal string.
fn money(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
        .filter(|d| !d.is_sign_negative())
}
