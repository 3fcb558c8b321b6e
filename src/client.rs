//! HTTP client for the defect warning backend.
//!
//! Typed wrappers over the /api/v1 contract. All calls are plain async
//! round-trips: no client-side timeout (a hung backend call blocks only its
//! own operation), no retry, no deduplication of overlapping requests —
//! staleness is handled by the panel's generation tokens, not here.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;

use crate::history::HistoryQuery;
use crate::provisioning::BatchImportRequest;
use crate::types::{
    AlertRecord, BatchDeleteResponse, BatchImportResponse, ConfigSnapshot, EffectiveConfig,
    GlobalDefaults, GlobalUpdateResponse, HealthStatus, Message, OptionSets,
};

/// Backend client errors. Validation failures never reach this layer; they
/// are caught locally before a request is issued.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned status {status}: {detail}")]
    Backend { status: StatusCode, detail: String },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error payload shape the backend uses for non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// Fallback notice when a non-success response carries no detail.
const GENERIC_BACKEND_ERROR: &str = "the backend reported an error";

/// Typed client for the defect warning service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given base URL.
    ///
    /// Deliberately no `.timeout()`: the execution model suspends the
    /// calling operation until the backend answers or the transport fails.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Turn a non-success response into [`ApiError::Backend`], surfacing the
    /// backend's `detail` verbatim when present.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = match response.json::<ErrorBody>().await {
            Ok(body) => body.detail.unwrap_or_else(|| GENERIC_BACKEND_ERROR.to_string()),
            Err(e) => {
                warn!(status = %status, error = %e, "non-JSON error body from backend");
                GENERIC_BACKEND_ERROR.to_string()
            }
        };
        Err(ApiError::Backend { status, detail })
    }

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    /// GET /health
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let response = self.http.get(self.url("/health")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// GET /api/v1/configs — the full item mapping plus global defaults.
    pub async fn fetch_configs(&self) -> Result<ConfigSnapshot, ApiError> {
        let response = self.http.get(self.url("/api/v1/configs")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// PUT /api/v1/configs/global — save the default policy, broadcast by
    /// the backend to the live detection pipeline.
    pub async fn save_global_defaults(
        &self,
        defaults: &GlobalDefaults,
    ) -> Result<GlobalUpdateResponse, ApiError> {
        let response = self
            .http
            .put(self.url("/api/v1/configs/global"))
            .json(defaults)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// PUT /api/v1/configs/{key} — upsert one entry with its resolved
    /// parameter set.
    pub async fn save_item_config(
        &self,
        key: &str,
        config: &EffectiveConfig,
    ) -> Result<Message, ApiError> {
        let response = self
            .http
            .put(self.url(&format!("/api/v1/configs/{key}")))
            .json(config)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// DELETE /api/v1/configs/{key} — irreversible single delete.
    pub async fn delete_item_config(&self, key: &str) -> Result<Message, ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/v1/configs/{key}")))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// POST /api/v1/configs/batch-delete — irreversible multi delete.
    pub async fn batch_delete(&self, keys: &[String]) -> Result<BatchDeleteResponse, ApiError> {
        let response = self
            .http
            .post(self.url("/api/v1/configs/batch-delete"))
            .json(&serde_json::json!({ "items": keys }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// POST /api/v1/items/batch-import — provision a validated batch.
    pub async fn batch_import(
        &self,
        request: &BatchImportRequest,
    ) -> Result<BatchImportResponse, ApiError> {
        let response = self
            .http
            .post(self.url("/api/v1/items/batch-import"))
            .json(request)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    // ------------------------------------------------------------------
    // History & Options
    // ------------------------------------------------------------------

    /// GET /api/v1/history — chronological record range.
    pub async fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<AlertRecord>, ApiError> {
        let response = self
            .http
            .get(self.url("/api/v1/history"))
            .query(&query.query_pairs())
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// GET /api/v1/options — context-filtered dropdown population. Only the
    /// identity fields of `query` participate.
    pub async fn fetch_options(&self, query: &HistoryQuery) -> Result<OptionSets, ApiError> {
        let pairs: Vec<(&str, String)> = query
            .query_pairs()
            .into_iter()
            .filter(|(name, _)| matches!(*name, "item_name" | "station" | "product" | "line"))
            .collect();
        let response = self
            .http
            .get(self.url("/api/v1/options"))
            .query(&pairs)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}
