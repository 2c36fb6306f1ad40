//! HTTP client for the upstream blockchain-timestamping API.
//!
//! ## Endpoints
//!
//! - `POST /v1/timestamp/post` - Stamp a hash
//! - `POST /v1/uid/status` - Batch status for a list of UIDs
//! - `POST /v1/verify/post-lite` - Verify a proof JSON
//! - `GET  <health_url>` - Upstream readiness probe
//!
//! The client performs exactly one network call per invocation and never
//! retries internally; the status-polling reconciler owns retry semantics.
//! The inner `reqwest::Client` is pooled and safely shared across polling
//! rounds and concurrent reconciliations.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::Settings;
use crate::error::{map_status, AdapterError};
use crate::reconcile::StatusBackend;
use crate::types::RawRecord;

const PATH_STAMP: &str = "/v1/timestamp/post";
const PATH_UID_STATUS: &str = "/v1/uid/status";
const PATH_VERIFY: &str = "/v1/verify/post-lite";

/// Per-call header context: request correlation ID plus the API key that
/// resolution picked for this call (per-request key, keyring, or config).
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Value for the `x-request-id` header.
    pub request_id: Option<String>,
    /// Value for the `x-api-key` header.
    pub api_key: Option<String>,
}

impl RequestContext {
    /// Context carrying only a request ID.
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            api_key: None,
        }
    }
}

/// Batch-status request body. The UID list is the full original request
/// set, resent every round per the upstream contract.
#[derive(Debug, Serialize)]
struct BatchStatusRequest<'a> {
    uids: &'a [String],
}

/// Batch-status response envelope. A 2xx with missing `data` is an empty
/// record list.
#[derive(Debug, Deserialize)]
struct BatchStatusResponse {
    #[serde(default)]
    data: Vec<Value>,
}

/// HTTP client for the upstream API.
pub struct UpstreamClient {
    /// Pooled HTTP client.
    client: Client,
    /// Base URL, no trailing slash.
    base_url: String,
    /// Upstream health probe URL.
    health_url: Option<String>,
}

impl UpstreamClient {
    /// Create a new upstream client from settings.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be constructed.
    pub fn new(settings: &Settings) -> Result<Self, AdapterError> {
        let client = ClientBuilder::new()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .tcp_nodelay(true)
            .user_agent(format!("integritas-mcp/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdapterError::Config {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: settings.api_base.trim_end_matches('/').to_string(),
            health_url: settings.health_url.clone(),
        })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the batch status for a list of UIDs.
    ///
    /// One POST per call; any non-2xx response or transport failure maps to
    /// a single batch-level `Err` carrying the response body or exception
    /// text. Records inside a 2xx body that lack a `uid` cannot be keyed to
    /// a requested identifier and are skipped with a warning.
    #[instrument(skip(self, uids, ctx), fields(uid_count = uids.len()))]
    pub async fn batch_status(
        &self,
        uids: &[String],
        ctx: &RequestContext,
    ) -> Result<Vec<RawRecord>, AdapterError> {
        let url = format!("{}{}", self.base_url, PATH_UID_STATUS);
        let request = self
            .client
            .post(&url)
            .json(&BatchStatusRequest { uids });

        let response = self.send(request, ctx, &url).await?;
        let envelope: BatchStatusResponse =
            response.json().await.map_err(|e| AdapterError::Permanent {
                message: format!("Failed to parse batch status response: {e}"),
            })?;

        let mut records = Vec::with_capacity(envelope.data.len());
        for value in envelope.data {
            match serde_json::from_value::<RawRecord>(value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    // A record without a UID cannot be applied to any state.
                    warn!(error = %e, "skipping unkeyable status record");
                },
            }
        }

        debug!(records = records.len(), "batch status fetched");
        Ok(records)
    }

    /// Stamp a (normalized) hash.
    ///
    /// Returns the raw JSON payload; [`crate::stamp`] turns it into a typed
    /// receipt.
    #[instrument(skip(self, ctx))]
    pub async fn stamp_hash(
        &self,
        hash_hex: &str,
        ctx: &RequestContext,
    ) -> Result<Value, AdapterError> {
        let url = format!("{}{}", self.base_url, PATH_STAMP);
        let request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "hash": hash_hex }));

        let response = self.send(request, ctx, &url).await?;
        response.json().await.map_err(|e| AdapterError::Permanent {
            message: format!("Failed to parse stamp response: {e}"),
        })
    }

    /// Submit a proof JSON for verification.
    #[instrument(skip(self, proof, ctx))]
    pub async fn verify_proof(
        &self,
        proof: &Value,
        ctx: &RequestContext,
    ) -> Result<Value, AdapterError> {
        let url = format!("{}{}", self.base_url, PATH_VERIFY);
        let request = self.client.post(&url).json(proof);

        let response = self.send(request, ctx, &url).await?;
        response.json().await.map_err(|e| AdapterError::Permanent {
            message: format!("Failed to parse verify response: {e}"),
        })
    }

    /// Probe the upstream health endpoint.
    ///
    /// Returns the HTTP status code and the observed latency.
    #[instrument(skip(self, ctx))]
    pub async fn health_probe(
        &self,
        ctx: &RequestContext,
    ) -> Result<(u16, Duration), AdapterError> {
        let url = self
            .health_url
            .clone()
            .ok_or_else(|| AdapterError::Config {
                message: "Upstream health URL not configured".into(),
            })?;

        let start = Instant::now();
        let request = self.client.get(&url);
        let response = self
            .apply_headers(request, ctx)
            .send()
            .await
            .map_err(|e| AdapterError::Transport {
                message: format!("Request to {url} failed: {e}"),
            })?;

        Ok((response.status().as_u16(), start.elapsed()))
    }

    /// Send a request, apply context headers, and surface non-2xx responses
    /// as taxonomy errors carrying the response body.
    async fn send(
        &self,
        request: RequestBuilder,
        ctx: &RequestContext,
        url: &str,
    ) -> Result<Response, AdapterError> {
        let response = self
            .apply_headers(request, ctx)
            .send()
            .await
            .map_err(|e| AdapterError::Transport {
                message: format!("Request to {url} failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = code, "upstream returned non-success status");
            return Err(map_status(code, &body));
        }

        debug!(url = %url, status = status.as_u16(), "upstream response received");
        Ok(response)
    }

    fn apply_headers(&self, request: RequestBuilder, ctx: &RequestContext) -> RequestBuilder {
        let mut request = request;
        if let Some(ref id) = ctx.request_id {
            request = request.header("x-request-id", id);
        }
        if let Some(ref key) = ctx.api_key {
            // Header value only; the key itself is never logged.
            request = request.header("x-api-key", key);
        }
        request
    }
}

/// A status client bound to one request's header context, usable as the
/// reconciler's backend.
pub struct BoundStatusClient<'a> {
    client: &'a UpstreamClient,
    ctx: RequestContext,
}

impl<'a> BoundStatusClient<'a> {
    /// Bind a client to a request context.
    pub fn new(client: &'a UpstreamClient, ctx: RequestContext) -> Self {
        Self { client, ctx }
    }
}

#[async_trait]
impl StatusBackend for BoundStatusClient<'_> {
    async fn fetch_batch(&self, uids: &[String]) -> Result<Vec<RawRecord>, AdapterError> {
        self.client.batch_status(uids, &self.ctx).await
    }
}
