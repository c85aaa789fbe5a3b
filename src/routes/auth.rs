//! Authentication routes: login, refresh, logout, profile.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::SessionToken;
use crate::models::user::UserProfile;
use crate::services::session::{self as session_service, Credentials, TokenPair};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<ApiResponse<TokenPair>>, AppError> {
    let Json(body) = body?;
    let tokens = session_service::login(&state.store, &body).await?;
    Ok(ApiResponse::success(tokens))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TokenPair>>, AppError> {
    let Json(body) = body?;
    body.validate()?;
    let tokens = session_service::refresh(&state.store, &body.refresh_token).await?;
    Ok(ApiResponse::success(tokens))
}

/// POST /api/v1/auth/logout: the client discards its tokens.
pub async fn logout() -> Json<ApiResponse<&'static str>> {
    ApiResponse::success("Logged out successfully")
}

/// GET /api/v1/auth/me: current user profile, as the Entity Store sees it.
pub async fn me(
    State(state): State<AppState>,
    SessionToken(session): SessionToken,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let user = session_service::current_user(&state.store, &session).await?;
    Ok(ApiResponse::success(user))
}
