//! Session handling: bearer tokens are issued and validated by the Entity
//! Store; the gateway only carries them.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::AppError;
use crate::models::user::UserProfile;
use crate::services::entity_store::HttpEntityStore;

/// Credentials of one authenticated caller, passed explicitly to every
/// Entity Store request made on its behalf.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Token pair returned to the presentation layer on login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
}

impl TokenPair {
    fn bearer(access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
        }
    }

    /// Session for follow-up calls made with these tokens.
    pub fn session(&self) -> Session {
        Session::new(self.access_token.clone())
    }
}

/// Authenticate against the Entity Store, returning a token pair.
pub async fn login(store: &HttpEntityStore, credentials: &Credentials) -> Result<TokenPair, AppError> {
    credentials.validate()?;

    let tokens = store
        .obtain_token(&credentials.username, &credentials.password)
        .await?;

    tracing::info!(username = %credentials.username, "User logged in");
    Ok(TokenPair::bearer(tokens.access, tokens.refresh))
}

/// Obtain a fresh access token. The store may or may not rotate the refresh
/// token; the previous one is kept when it does not.
pub async fn refresh(store: &HttpEntityStore, refresh_token: &str) -> Result<TokenPair, AppError> {
    if refresh_token.trim().is_empty() {
        return Err(AppError::Validation("refresh_token is required".to_string()));
    }

    let tokens = store.refresh_token(refresh_token).await?;
    let refresh = tokens.refresh.or_else(|| Some(refresh_token.to_string()));
    Ok(TokenPair::bearer(tokens.access, refresh))
}

/// Identity of the session's user, as the Entity Store reports it.
pub async fn current_user(store: &HttpEntityStore, session: &Session) -> Result<UserProfile, AppError> {
    Ok(store.current_user(session).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let session = Session::new("eyJhbGciOiJIUzI1NiJ9.secret");
        let printed = format!("{session:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn credentials_require_both_fields() {
        let empty = Credentials {
            username: "".to_string(),
            password: "".to_string(),
        };
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(errors.field_errors().contains_key("password"));

        let ok = Credentials {
            username: "alpha_owner".to_string(),
            password: "password".to_string(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn token_pair_session_uses_access_token() {
        let pair = TokenPair::bearer("access".to_string(), Some("refresh".to_string()));
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.session(), Session::new("access"));
    }
}
