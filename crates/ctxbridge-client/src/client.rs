//! HTTP client for the remote context API.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use ctxbridge_core::config::{ConfigError, ConfigIssue, ContextConfig};
use ctxbridge_core::models::{
    InsertContextRequest, InsertContextResponse, SearchContextRequest, SearchContextResponse,
};
use ctxbridge_core::{defaults, ContextApi, Error, Operation, Result};

use crate::normalize::{normalize_insert, normalize_search};
use crate::request::{insert_body, search_body};

/// Client for the context insert/search endpoints.
///
/// Headers are fixed at construction. Each call issues one POST bounded by
/// the configured timeout; when the timeout fires the in-flight request is
/// dropped and the call fails with [`Error::Timeout`]. Nothing is retried.
#[derive(Debug, Clone)]
pub struct ContextApiClient {
    client: Client,
    config: ContextConfig,
    headers: HeaderMap,
}

impl ContextApiClient {
    /// Create a client for the given configuration.
    pub fn new(config: ContextConfig) -> Result<Self> {
        let headers = build_headers(config.api_key.as_deref())?;

        let client = Client::builder()
            .default_headers(headers.clone())
            .build()
            .map_err(|e| {
                ConfigError::Validation(vec![ConfigIssue::new(
                    "httpClient",
                    format!("failed to create HTTP client: {}", e),
                )])
            })?;

        info!(
            subsystem = "client",
            insert = %config.insert_endpoint,
            search = %config.search_endpoint,
            timeout_ms = config.api_timeout_ms,
            authenticated = config.api_key.is_some(),
            "Initializing context API client"
        );

        Ok(Self {
            client,
            config,
            headers,
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// POST `body` to `endpoint` and decode the 2xx JSON response.
    ///
    /// The whole exchange, including reading the body, runs under one
    /// deadline. Dropping the exchange future on expiry cancels the request
    /// and releases the timer on every exit path.
    async fn post_json(&self, operation: Operation, endpoint: &Url, body: &Value) -> Result<Value> {
        let start = Instant::now();
        let exchange = async {
            let response = self
                .client
                .post(endpoint.clone())
                .json(body)
                .send()
                .await
                .map_err(|e| classify_transport(operation, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(Error::Http {
                    operation,
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or_default().to_string(),
                });
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| classify_transport(operation, e))
        };

        let result = match tokio::time::timeout(self.config.timeout(), exchange).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout { operation }),
        };

        let elapsed = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(duration_ms = elapsed, "Upstream call complete"),
            Err(e) => warn!(duration_ms = elapsed, error = %e, "Upstream call failed"),
        }
        if elapsed > defaults::SLOW_CALL_MS {
            warn!(duration_ms = elapsed, slow = true, "Slow context API call");
        }

        result
    }
}

#[async_trait]
impl ContextApi for ContextApiClient {
    #[instrument(skip(self, request), fields(
        subsystem = "client",
        component = "context_api",
        op = "insert_context",
        request_id = %uuid::Uuid::now_v7(),
        content_len = request.content.len(),
    ))]
    async fn insert_context(
        &self,
        request: &InsertContextRequest,
    ) -> Result<InsertContextResponse> {
        let body = insert_body(request, chrono::Utc::now());
        let value = self
            .post_json(Operation::Insert, &self.config.insert_endpoint, &body)
            .await?;

        let response = normalize_insert(&value);
        debug!(
            success = response.success,
            id = response.id.as_deref().unwrap_or(""),
            "Insert complete"
        );
        Ok(response)
    }

    #[instrument(skip(self, request), fields(
        subsystem = "client",
        component = "context_api",
        op = "search_context",
        request_id = %uuid::Uuid::now_v7(),
        k = request.effective_k(),
    ))]
    async fn search_context(
        &self,
        request: &SearchContextRequest,
    ) -> Result<SearchContextResponse> {
        let body = search_body(request);
        let value = self
            .post_json(Operation::Search, &self.config.search_endpoint, &body)
            .await?;

        let response = normalize_search(&value);
        debug!(
            success = response.success,
            result_count = response.results.len(),
            "Search complete"
        );
        Ok(response)
    }
}

fn build_headers(api_key: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(defaults::USER_AGENT));

    if let Some(key) = api_key {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| {
            ConfigError::Validation(vec![ConfigIssue::new(
                "apiKey",
                "contains characters not allowed in an HTTP header",
            )])
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

fn classify_transport(operation: Operation, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        return Error::Timeout { operation };
    }
    Error::unknown(operation, error_chain(&e))
}

/// Render an error with its sources, which reqwest keeps out of `Display`.
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
