//! Dashboard routes: aggregated statistics for the overview page.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::SessionToken;
use crate::services::dashboard::{self, DashboardOptions, DashboardReport};
use crate::AppState;

/// GET /api/v1/dashboard/stats: always answers once a token is present;
/// sources that fail show up as warnings in the report.
pub async fn stats(
    State(state): State<AppState>,
    SessionToken(session): SessionToken,
) -> Result<Json<ApiResponse<DashboardReport>>, AppError> {
    let options = DashboardOptions::from_config(&state.config, Utc::now().date_naive());
    let report = dashboard::load_dashboard(&state.store, &session, &options).await;
    Ok(ApiResponse::success(report))
}
