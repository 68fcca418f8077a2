//! Authenticated Pluggy API Client
//!
//! Each instance owns at most one cached credential. Every call first makes
//! sure the credential is still valid, exchanging client id and secret
//! against `POST /auth` when it is not, then sends the request with the
//! API key in `X-API-KEY`. There are no retries at this layer.

use chrono::Utc;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Instant;

use super::credential::{AuthRequest, AuthResponse, Credential};
use super::reference::CompositeAccountRef;
use super::transport::{SharedTransport, TransportError, UpstreamRequest, UpstreamResponse};
use super::types::{
    AuthDebugInfo, ListEnvelope, Pagination, PixPaymentPayload, PixTransferRequest,
    PixTransferResult, SandboxItemParams, TransactionFilters, TransactionsResponse, DEFAULT_PAGE,
    DEFAULT_ITEMS_PAGE_SIZE, DEFAULT_TRANSACTIONS_PAGE_SIZE,
};
use crate::common::config::{GatewayConfig, UpstreamConfig};
use crate::common::error::{GatewayError, Result};
use crate::common::logging::{log_upstream_call, mask_secret};
use crate::common::validation::validate_path_segment;
use crate::enrich::EnrichInput;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Pluggy API client with per-instance credential caching
pub struct PluggyClient {
    config: UpstreamConfig,
    backend_url: String,
    transport: SharedTransport,
    credential: Option<Credential>,
}

impl PluggyClient {
    pub fn new(
        config: UpstreamConfig,
        backend_url: impl Into<String>,
        transport: SharedTransport,
    ) -> Self {
        tracing::debug!(
            base_url = %config.base_url,
            client_id = %mask_secret(&config.client_id, 4),
            "Pluggy client created"
        );

        Self {
            config,
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            transport,
            credential: None,
        }
    }

    pub fn from_config(config: &GatewayConfig, transport: SharedTransport) -> Self {
        Self::new(config.upstream.clone(), config.backend_url.clone(), transport)
    }

    /// Currently cached credential, if any
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Return the cached credential, refreshing it when missing or about to expire
    pub async fn acquire_credential(&mut self) -> Result<&Credential> {
        let now = Utc::now();
        let credential = match self.credential.take() {
            Some(cached) if cached.is_valid_at(now) => cached,
            _ => self.exchange_credential().await?,
        };

        Ok(self.credential.insert(credential))
    }

    /// Exchange client id and secret for a fresh API key
    async fn exchange_credential(&self) -> Result<Credential> {
        let url = format!("{}/auth", self.config.base_url);
        let body = serde_json::to_value(AuthRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
        })
        .map_err(|e| GatewayError::decode(e.to_string()))?;

        let request = UpstreamRequest::new(Method::POST, url)
            .with_header("Content-Type", JSON_CONTENT_TYPE)
            .with_header("Accept", JSON_CONTENT_TYPE)
            .with_json(body);

        let started = Instant::now();
        let response = self.transport.send(request).await?;
        let elapsed = elapsed_ms(started);

        if !response.is_success() {
            log_upstream_call("POST", "/auth", response.status, elapsed, Some(&response.body));
            return Err(GatewayError::UpstreamAuth {
                status: response.status,
                body: response.body,
            });
        }
        log_upstream_call("POST", "/auth", response.status, elapsed, None);

        let auth: AuthResponse = response
            .json()
            .map_err(|e| GatewayError::decode(format!("/auth returned invalid JSON: {}", e)))?;
        let credential = Credential::from_auth_response(auth, Utc::now())?;

        tracing::info!(
            key_prefix = %credential.key_prefix(),
            expires_at = %credential.expires_iso(),
            "Pluggy credential refreshed"
        );

        Ok(credential)
    }

    // =========================================================================
    // Generic request
    // =========================================================================

    /// Send an authenticated request and decode the JSON response
    ///
    /// `path` is split on `/` and each piece is sent as one encoded segment.
    pub async fn request<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.request_with_query(method, &segments, &[], body).await
    }

    async fn request_with_query<T: DeserializeOwned>(
        &mut self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T> {
        let (response, path) = self.send_authenticated(method, segments, query, body).await?;
        decode_body(&response, &path)
    }

    /// Returns the response together with the path (and query) that was called
    async fn send_authenticated(
        &mut self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<(UpstreamResponse, String)> {
        let token = self.acquire_credential().await?.token().to_string();
        let url = self.endpoint(segments, query)?;
        let display_path = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };

        let mut request = UpstreamRequest::new(method.clone(), url.as_str())
            .with_header("Accept", JSON_CONTENT_TYPE)
            .with_header("Content-Type", JSON_CONTENT_TYPE)
            .with_header("X-API-KEY", token);
        if let Some(body) = body {
            request = request.with_json(body);
        }

        let started = Instant::now();
        let response = self.transport.send(request).await?;
        let elapsed = elapsed_ms(started);

        if !response.is_success() {
            log_upstream_call(
                method.as_str(),
                &display_path,
                response.status,
                elapsed,
                Some(&response.body),
            );
            return Err(GatewayError::UpstreamRequest {
                status: response.status,
                path: display_path,
                body: response.body,
            });
        }

        log_upstream_call(method.as_str(), &display_path, response.status, elapsed, None);
        Ok((response, display_path))
    }

    /// Base URL plus `segments`, each percent-encoded as a single path segment
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url> {
        let base = &self.config.base_url;
        let invalid = |reason: String| GatewayError::from(TransportError::InvalidUrl(reason));

        let mut url = Url::parse(base).map_err(|e| invalid(format!("{}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("{}: not a base URL", base)))?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// List transactions of an account (`itemId_accountId` or bare account id)
    pub async fn list_transactions(
        &mut self,
        account_ref: &str,
        filters: &TransactionFilters,
    ) -> Result<TransactionsResponse> {
        let reference = CompositeAccountRef::parse(account_ref)?;

        let mut query: Vec<(&str, String)> = vec![("accountId", reference.account_id)];
        if let Some(from) = &filters.from {
            query.push(("from", from.clone()));
        }
        if let Some(to) = &filters.to {
            query.push(("to", to.clone()));
        }
        query.push(("page", filters.page.unwrap_or(DEFAULT_PAGE).to_string()));
        query.push((
            "pageSize",
            filters
                .page_size
                .unwrap_or(DEFAULT_TRANSACTIONS_PAGE_SIZE)
                .to_string(),
        ));

        let envelope: ListEnvelope<Value> = self
            .request_with_query(Method::GET, &["transactions"], &query, None)
            .await?;

        if filters.latest {
            return Ok(TransactionsResponse::Latest(envelope.results.into_iter().next()));
        }
        Ok(TransactionsResponse::Page(envelope))
    }

    /// Create a PIX payment through Smart Transfers
    pub async fn create_pix_transfer(
        &mut self,
        params: &PixTransferRequest,
    ) -> Result<PixTransferResult> {
        params.validate()?;

        let payload = serde_json::to_value(PixPaymentPayload::from(params))
            .map_err(|e| GatewayError::decode(e.to_string()))?;
        let raw: Value = self
            .request(Method::POST, "/smart-transfers/payments", Some(payload))
            .await?;

        Ok(PixTransferResult::from_upstream(raw))
    }

    pub async fn list_items(&mut self, pagination: Pagination) -> Result<ListEnvelope<Value>> {
        let query = [
            ("page", pagination.page.unwrap_or(DEFAULT_PAGE).to_string()),
            (
                "pageSize",
                pagination
                    .page_size
                    .unwrap_or(DEFAULT_ITEMS_PAGE_SIZE)
                    .to_string(),
            ),
        ];

        self.request_with_query(Method::GET, &["items"], &query, None)
            .await
    }

    pub async fn list_accounts_for_item(&mut self, item_id: &str) -> Result<Value> {
        validate_path_segment(item_id, "itemId").into_result()?;
        self.request_with_query(Method::GET, &["items", item_id, "accounts"], &[], None)
            .await
    }

    /// Create an item on a sandbox connector
    pub async fn create_sandbox_item(&mut self, params: &SandboxItemParams) -> Result<Value> {
        params.validate()?;

        let body = serde_json::to_value(params).map_err(|e| GatewayError::decode(e.to_string()))?;
        self.request(Method::POST, "/items", Some(body)).await
    }

    pub async fn get_item(&mut self, item_id: &str) -> Result<Value> {
        validate_path_segment(item_id, "itemId").into_result()?;
        self.request_with_query(Method::GET, &["items", item_id], &[], None)
            .await
    }

    /// Force a credential exchange and report the new key's prefix and expiry
    pub async fn debug_auth(&mut self) -> Result<AuthDebugInfo> {
        let credential = self.exchange_credential().await?;
        let info = AuthDebugInfo {
            key_prefix: credential.key_prefix(),
            exp_iso: credential.expires_iso(),
        };
        self.credential = Some(credential);

        Ok(info)
    }

    /// Post upstream transactions to the enrichment endpoint
    ///
    /// The upstream API key is not sent along.
    pub async fn enrich_transactions(&self, transactions: &[Value]) -> Result<Value> {
        let today = Utc::now().date_naive();
        let data: Vec<EnrichInput> = transactions
            .iter()
            .map(|tx| EnrichInput::from_upstream(tx, today))
            .collect();

        let request = UpstreamRequest::new(Method::POST, format!("{}/enrich", self.backend_url))
            .with_header("Content-Type", JSON_CONTENT_TYPE)
            .with_header("Accept", JSON_CONTENT_TYPE)
            .with_json(json!({ "data": data }));

        let started = Instant::now();
        let response = self.transport.send(request).await?;
        let elapsed = elapsed_ms(started);

        if !response.is_success() {
            log_upstream_call("POST", "/enrich", response.status, elapsed, Some(&response.body));
            return Err(GatewayError::UpstreamRequest {
                status: response.status,
                path: "/enrich".to_string(),
                body: response.body,
            });
        }
        log_upstream_call("POST", "/enrich", response.status, elapsed, None);

        decode_body(&response, "/enrich")
    }
}

fn decode_body<T: DeserializeOwned>(response: &UpstreamResponse, path: &str) -> Result<T> {
    let body = if response.body.trim().is_empty() {
        "null"
    } else {
        response.body.as_str()
    };

    serde_json::from_str(body)
        .map_err(|e| GatewayError::decode(format!("{} returned invalid JSON: {}", path, e)))
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
