//! Route definitions for the Aqario gateway API.

pub mod auth;
pub mod dashboard;
pub mod entities;
pub mod health;

use std::time::Duration;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let cors = match state.config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new().allow_origin(origin),
        Err(_) => {
            tracing::warn!(frontend_url = %state.config.frontend_url, "Invalid FRONTEND_URL, allowing any origin");
            CorsLayer::new().allow_origin(Any)
        }
    }
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Upstream calls are bounded by the store timeout; leave room for paging.
    // The dashboard is not covered: it bounds each source itself and reports
    // late ones as warnings.
    let request_timeout =
        Duration::from_secs(state.config.entity_store_timeout_secs.saturating_mul(3).max(5));

    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    let dashboard_routes = Router::new().route("/dashboard/stats", get(dashboard::stats));

    let entity_routes = Router::new()
        .route("/properties", get(entities::list_properties))
        .route("/clients", get(entities::list_clients))
        .route("/contracts", get(entities::list_contracts))
        .route("/invoices", get(entities::list_invoices));

    let bounded_routes = auth_routes.merge(entity_routes).layer(TimeoutLayer::with_status_code(
        StatusCode::GATEWAY_TIMEOUT,
        request_timeout,
    ));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", bounded_routes.merge(dashboard_routes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
