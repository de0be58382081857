//! HTTP client for the approval service
//!
//! Every request carries a bounded timeout; an elapsed timeout surfaces as
//! [`ClientError::Timeout`] rather than a generic transport failure.

use content_model::api::{
    ErrorBody, HealthResponse, StatusUpdateRequest, StatusUpdateResponse, SyncItem, SyncRequest,
    SyncResponse,
};
use content_model::{ContentItem, Status};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,

    #[error("server returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unreadable response: {0}")]
    Decode(String),

    #[error("content item {0} is not loaded")]
    UnknownItem(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Approval service client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    if text.is_empty() {
                        status.canonical_reason().unwrap_or("Unknown error").to_string()
                    } else {
                        text
                    }
                });
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `GET /api/content`
    pub async fn get_content(&self) -> Result<Vec<ContentItem>> {
        let items: Vec<ContentItem> = self.send(self.client.get(self.url("/api/content"))).await?;
        debug!(count = items.len(), "Fetched content");
        Ok(items)
    }

    /// `POST /api/content/status`
    pub async fn update_status(
        &self,
        id: &str,
        status: Status,
        feedback: Option<&str>,
    ) -> Result<StatusUpdateResponse> {
        let body = StatusUpdateRequest {
            id: id.to_string(),
            status,
            feedback: feedback.map(str::to_string),
        };
        self.send(self.client.post(self.url("/api/content/status")).json(&body))
            .await
    }

    /// `POST /api/content/sync`
    pub async fn sync_content(&self, items: Vec<SyncItem>) -> Result<SyncResponse> {
        let body = SyncRequest { items };
        self.send(self.client.post(self.url("/api/content/sync")).json(&body))
            .await
    }

    /// `true` only when `/health` answers 2xx with `status: "healthy"`.
    pub async fn health_check(&self) -> bool {
        match self
            .send::<HealthResponse>(self.client.get(self.url("/health")))
            .await
        {
            Ok(health) => health.status == "healthy",
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }
}
