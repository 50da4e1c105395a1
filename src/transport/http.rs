//! HTTP transport over `reqwest`.

use super::ListTransport;
use crate::domain::{ListResponse, ListingError, QueryParams, ResourceKey, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

/// Client for a REST backend exposing paginated collections.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport rooted at `base_url` (e.g. `http://localhost:8000/api`).
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, resource: &ResourceKey) -> String {
        format!("{}/{}/", self.base_url, resource)
    }

    fn item_url(&self, resource: &ResourceKey, id: &str) -> String {
        format!("{}/{}/{}/", self.base_url, resource, id.trim_matches('/'))
    }

    fn send_error(&self, err: reqwest::Error) -> ListingError {
        if err.is_connect() {
            ListingError::Transport(format!("cannot connect to {}", self.base_url))
        } else if err.is_timeout() {
            ListingError::Transport(format!("request to {} timed out", self.base_url))
        } else {
            ListingError::from(err)
        }
    }

    /// Turns non-2xx answers into [`ListingError::Status`].
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body)
            .or_else(|| status.canonical_reason().map(String::from))
            .unwrap_or_else(|| "request failed".to_string());

        tracing::debug!(status = status.as_u16(), message = %message, "backend rejected request");
        Err(ListingError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn json_body(response: Response) -> Result<Value> {
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Extracts a human-readable message from an error body.
///
/// Prefers the `detail` or `message` field of a JSON object, then the raw
/// body; `None` for a blank body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["detail", "message"] {
            match map.get(key) {
                Some(Value::String(text)) => return Some(text.clone()),
                Some(other) if !other.is_null() => return Some(other.to_string()),
                _ => {}
            }
        }
    }

    Some(trimmed.to_string())
}

#[async_trait]
impl ListTransport for HttpTransport {
    async fn fetch_page(
        &self,
        resource: &ResourceKey,
        params: &QueryParams,
    ) -> Result<ListResponse<Value>> {
        let url = self.collection_url(resource);
        tracing::debug!(url = %url, params = %params, "GET collection page");

        let response = self
            .client
            .get(&url)
            .query(&params.to_pairs())
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let response = Self::check(response).await?;
        Ok(response.json::<ListResponse<Value>>().await?)
    }

    async fn create(&self, resource: &ResourceKey, body: &Value) -> Result<Value> {
        let url = self.collection_url(resource);
        tracing::debug!(url = %url, "POST record");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        Self::json_body(Self::check(response).await?).await
    }

    async fn update(&self, resource: &ResourceKey, id: &str, body: &Value) -> Result<Value> {
        let url = self.item_url(resource, id);
        tracing::debug!(url = %url, "PUT record");

        let response = self
            .client
            .put(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        Self::json_body(Self::check(response).await?).await
    }

    async fn delete(&self, resource: &ResourceKey, id: &str) -> Result<()> {
        let url = self.item_url(resource, id);
        tracing::debug!(url = %url, "DELETE record");

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        Self::check(response).await?;
        Ok(())
    }
}
