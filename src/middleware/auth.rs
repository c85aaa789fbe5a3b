//! Bearer token extractor for Axum handlers.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::services::session::Session;

/// Caller's session, taken from the `Authorization: Bearer` header.
///
/// The token is not inspected here; the Entity Store validates it on the
/// first request made with it. Use as an extractor in handlers that call the
/// store on the caller's behalf:
/// ```ignore
/// async fn handler(SessionToken(session): SessionToken) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct SessionToken(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for SessionToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        bearer_token(auth_header)
            .map(|token| SessionToken(Session::new(token)))
            .ok_or(AppError::Unauthorized)
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn extract(header: Option<&str>) -> Result<SessionToken, AppError> {
        let mut builder = Request::builder().uri("/api/v1/dashboard/stats");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        tokio_test::block_on(SessionToken::from_request_parts(&mut parts, &()))
    }

    #[test]
    fn reads_bearer_token() {
        let SessionToken(session) = extract(Some("Bearer abc.def.ghi")).unwrap();
        assert_eq!(session.access_token(), "abc.def.ghi");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let SessionToken(session) = extract(Some("bearer tok")).unwrap();
        assert_eq!(session.access_token(), "tok");
    }

    #[test]
    fn missing_or_malformed_header_is_unauthorized() {
        assert!(matches!(extract(None).unwrap_err(), AppError::Unauthorized));
        assert!(matches!(extract(Some("Basic dXNlcjpwYXNz")).unwrap_err(), AppError::Unauthorized));
        assert!(matches!(extract(Some("Bearer ")).unwrap_err(), AppError::Unauthorized));
        assert!(matches!(extract(Some("Bearer")).unwrap_err(), AppError::Unauthorized));
    }
}
