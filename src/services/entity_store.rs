//! HTTP client for the Entity Store: the REST service that owns properties,
//! clients, contracts and invoices, and issues bearer tokens.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::models::user::UserProfile;
use crate::services::session::Session;

/// Errors talking to the Entity Store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("entity store rejected the credentials")]
    Unauthorized,

    #[error("entity store returned status {0}")]
    Status(u16),

    #[error("entity store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("entity store returned an unreadable body: {0}")]
    Decode(String),

    #[error("entity store returned an unexpected shape: {0}")]
    UnexpectedShape(String),

    #[error("entity store listing exceeded {0} pages")]
    PageLimit(usize),
}

/// Collections exposed by the Entity Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Properties,
    Clients,
    Contracts,
    Invoices,
}

impl Resource {
    /// Path relative to the store's API root.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Properties => "properties/",
            Self::Clients => "clients/",
            Self::Contracts => "contracts/",
            Self::Invoices => "finance/",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Properties => "properties",
            Self::Clients => "clients",
            Self::Contracts => "contracts",
            Self::Invoices => "invoices",
        }
    }
}

/// Read access the dashboard needs from the Entity Store.
pub trait EntityStore: Send + Sync {
    /// Every record of a collection, as raw JSON objects.
    fn list(
        &self,
        session: &Session,
        resource: Resource,
    ) -> impl Future<Output = Result<Vec<Value>, StoreError>> + Send;

    /// Precomputed statistics object, if the store provides one.
    fn dashboard_stats(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Value, StoreError>> + Send;
}

/// Token payload returned by the store's token endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpEntityStore {
    client: Client,
    base_url: String,
    max_pages: usize,
}

impl HttpEntityStore {
    pub fn new(base_url: &str, timeout: Duration, max_pages: usize) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_pages: max_pages.max(1),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        Self::new(
            &config.entity_store_url,
            Duration::from_secs(config.entity_store_timeout_secs),
            config.entity_store_max_pages,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Only follow page links under the store's own base URL, since the
    /// caller's bearer token goes with every request.
    fn checked_next(&self, next: Option<String>) -> Result<Option<String>, StoreError> {
        match next {
            Some(url) if !url.starts_with(&format!("{}/", self.base_url)) => {
                tracing::warn!(next = %url, "Refusing page link outside the entity store");
                Err(StoreError::UnexpectedShape(
                    "next link outside the entity store".to_string(),
                ))
            }
            other => Ok(other),
        }
    }

    /// Exchange username and password for a token pair.
    pub async fn obtain_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<StoreTokens, StoreError> {
        let response = self
            .client
            .post(self.url("auth/token/"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        decode(read_json(response).await?)
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh_token(&self, refresh: &str) -> Result<StoreTokens, StoreError> {
        let response = self
            .client
            .post(self.url("auth/token/refresh/"))
            .json(&json!({ "refresh": refresh }))
            .send()
            .await?;
        decode(read_json(response).await?)
    }

    pub async fn current_user(&self, session: &Session) -> Result<UserProfile, StoreError> {
        decode(self.get_json(&self.url("auth/me/"), session).await?)
    }

    /// Create a record in a collection and return the stored representation.
    pub async fn create<B: Serialize + ?Sized>(
        &self,
        session: &Session,
        resource: Resource,
        body: &B,
    ) -> Result<Value, StoreError> {
        let response = self
            .client
            .post(self.url(resource.path()))
            .bearer_auth(session.access_token())
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Reachability check against the API root.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let response = self.client.get(self.url("")).send().await?;
        if response.status().is_server_error() {
            return Err(StoreError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn get_json(&self, url: &str, session: &Session) -> Result<Value, StoreError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(session.access_token())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Entity store request failed");
                StoreError::Transport(e)
            })?;
        read_json(response).await
    }
}

impl EntityStore for HttpEntityStore {
    async fn list(&self, session: &Session, resource: Resource) -> Result<Vec<Value>, StoreError> {
        let mut records = Vec::new();
        let mut next = Some(self.url(resource.path()));
        let mut pages = 0;

        while let Some(url) = next {
            if pages == self.max_pages {
                return Err(StoreError::PageLimit(self.max_pages));
            }
            let body = self.get_json(&url, session).await?;
            let (items, following) = split_page(body)?;
            records.extend(items);
            next = self.checked_next(following)?;
            pages += 1;
        }

        tracing::debug!(
            resource = resource.name(),
            records = records.len(),
            pages,
            "Fetched entity store collection"
        );
        Ok(records)
    }

    async fn dashboard_stats(&self, session: &Session) -> Result<Value, StoreError> {
        self.get_json(&self.url("dashboard/stats/"), session).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, StoreError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(StoreError::Unauthorized);
    }
    if !status.is_success() {
        return Err(StoreError::Status(status.as_u16()));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Split one listing response into its records and the next page URL.
///
/// Accepts a bare array or a paginated `{ "results": [...], "next": ... }`
/// envelope.
pub fn split_page(body: Value) -> Result<(Vec<Value>, Option<String>), StoreError> {
    match body {
        Value::Array(items) => Ok((items, None)),
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => {
                let next = match map.remove("next") {
                    Some(Value::String(url)) if !url.is_empty() => Some(url),
                    _ => None,
                };
                Ok((items, next))
            }
            _ => Err(StoreError::UnexpectedShape(
                "object without a results array".to_string(),
            )),
        },
        other => Err(StoreError::UnexpectedShape(format!(
            "expected a list, got {}",
            json_kind(&other)
        ))),
    }
}

/// Decode records one by one. Records that cannot be read are dropped and
/// counted instead of failing the whole collection.
pub fn decode_records<T: DeserializeOwned>(records: Vec<Value>) -> (Vec<T>, usize) {
    let mut items = Vec::with_capacity(records.len());
    let mut dropped = 0;
    for record in records {
        match serde_json::from_value::<T>(record) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unreadable entity record");
                dropped += 1;
            }
        }
    }
    (items, dropped)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
