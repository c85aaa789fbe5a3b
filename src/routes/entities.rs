//! List routes for the entity screens, proxied from the Entity Store.

use std::str::FromStr;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::SessionToken;
use crate::models::client::Client;
use crate::models::contract::Contract;
use crate::models::invoice::{Invoice, InvoiceStatus, InvoiceSummary};
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::property::Property;
use crate::services::aggregator::{classify_invoice_status, OverduePolicy};
use crate::services::entity_store::{decode_records, EntityStore, Resource};
use crate::services::session::Session;
use crate::AppState;

/// Invoice list filters.
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFilters {
    /// Matches the effective status, not the stored one.
    pub status: Option<String>,
}

/// GET /api/v1/properties
pub async fn list_properties(
    State(state): State<AppState>,
    SessionToken(session): SessionToken,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<ApiResponse<PagedResult<Property>>>, AppError> {
    let Query(pagination) = pagination?;
    let items = fetch_all(&state, &session, Resource::Properties).await?;
    Ok(ApiResponse::success(PagedResult::from_all(items, &pagination)))
}

/// GET /api/v1/clients
pub async fn list_clients(
    State(state): State<AppState>,
    SessionToken(session): SessionToken,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<ApiResponse<PagedResult<Client>>>, AppError> {
    let Query(pagination) = pagination?;
    let items = fetch_all(&state, &session, Resource::Clients).await?;
    Ok(ApiResponse::success(PagedResult::from_all(items, &pagination)))
}

/// GET /api/v1/contracts
pub async fn list_contracts(
    State(state): State<AppState>,
    SessionToken(session): SessionToken,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<ApiResponse<PagedResult<Contract>>>, AppError> {
    let Query(pagination) = pagination?;
    let items = fetch_all(&state, &session, Resource::Contracts).await?;
    Ok(ApiResponse::success(PagedResult::from_all(items, &pagination)))
}

/// GET /api/v1/invoices: invoices with derived tax, total and effective status.
pub async fn list_invoices(
    State(state): State<AppState>,
    SessionToken(session): SessionToken,
    pagination: Result<Query<Pagination>, QueryRejection>,
    filters: Result<Query<InvoiceFilters>, QueryRejection>,
) -> Result<Json<ApiResponse<PagedResult<InvoiceSummary>>>, AppError> {
    let Query(pagination) = pagination?;
    let Query(filters) = filters?;
    let wanted = filters
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(InvoiceStatus::from_str)
        .transpose()
        .map_err(AppError::Validation)?;

    let invoices: Vec<Invoice> = fetch_all(&state, &session, Resource::Invoices).await?;
    let summaries = summarize(
        invoices,
        wanted,
        Utc::now().date_naive(),
        state.config.overdue_policy,
    );
    Ok(ApiResponse::success(PagedResult::from_all(summaries, &pagination)))
}

async fn fetch_all<T: DeserializeOwned>(
    state: &AppState,
    session: &Session,
    resource: Resource,
) -> Result<Vec<T>, AppError> {
    let records = state.store.list(session, resource).await?;
    let (items, dropped) = decode_records::<T>(records);
    if dropped > 0 {
        tracing::warn!(source = resource.name(), dropped, "Skipped unreadable records");
    }
    Ok(items)
}

/// Attach effective statuses and keep the invoices matching `wanted`.
fn summarize(
    invoices: Vec<Invoice>,
    wanted: Option<InvoiceStatus>,
    as_of: NaiveDate,
    policy: OverduePolicy,
) -> Vec<InvoiceSummary> {
    invoices
        .into_iter()
        .filter_map(|invoice| {
            let effective = classify_invoice_status(&invoice, as_of, policy);
            match wanted {
                Some(status) if status != effective => None,
                _ => Some(InvoiceSummary::new(invoice, effective)),
            }
        })
        .collect()
}
