//! Request and response types exchanged with the Pluggy API.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::common::error::Result;
use crate::common::validation::{
    validate_http_url, validate_non_empty, validate_positive, validate_positive_amount,
};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_TRANSACTIONS_PAGE_SIZE: u32 = 100;
pub const DEFAULT_ITEMS_PAGE_SIZE: u32 = 50;

pub const DEFAULT_PIX_DESCRIPTION: &str = "PIX via Smart Transfers";
pub const DEFAULT_PIX_STATUS: &str = "CREATED";

pub const DEFAULT_SANDBOX_CONNECTOR_ID: i64 = 2;
pub const DEFAULT_SANDBOX_USER: &str = "user-ok";
pub const DEFAULT_SANDBOX_PASSWORD: &str = "password-ok";

// =============================================================================
// Listings
// =============================================================================

/// Paginated upstream listing; unknown fields pass through untouched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEnvelope<T> {
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        bound(deserialize = "T: Deserialize<'de>")
    )]
    pub results: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `null` and a missing field both mean no results
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Page selection for listings
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl Pagination {
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.page, "page")
            .merge(validate_positive(self.page_size, "pageSize"))
            .into_result()
    }
}

/// Filters for `GET /transactions`
#[derive(Debug, Clone, Default)]
pub struct TransactionFilters {
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Only return the most recent transaction
    pub latest: bool,
}

/// Result of a transactions lookup: the whole page, or only the latest entry
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TransactionsResponse {
    Page(ListEnvelope<Value>),
    Latest(Option<Value>),
}

// =============================================================================
// PIX
// =============================================================================

/// Inbound PIX transfer request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixTransferRequest {
    /// Preauthorization id on the upstream side
    pub from_account_id: String,
    /// Recipient id on the upstream side
    pub to_account_id: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PixTransferRequest {
    pub fn validate(&self) -> Result<()> {
        validate_non_empty(&self.from_account_id, "fromAccountId")
            .merge(validate_non_empty(&self.to_account_id, "toAccountId"))
            .merge(validate_positive_amount(self.amount, "amount"))
            .into_result()
    }
}

/// Payload of `POST /smart-transfers/payments`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PixPaymentPayload {
    pub preauthorization_id: String,
    pub recipient_id: String,
    pub amount: f64,
    pub description: String,
}

impl From<&PixTransferRequest> for PixPaymentPayload {
    fn from(req: &PixTransferRequest) -> Self {
        Self {
            preauthorization_id: req.from_account_id.clone(),
            recipient_id: req.to_account_id.clone(),
            amount: req.amount,
            description: req
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_PIX_DESCRIPTION.to_string()),
        }
    }
}

/// Normalized payment creation result
#[derive(Debug, Clone, Serialize)]
pub struct PixTransferResult {
    pub id: Option<String>,
    pub status: String,
    pub raw: Value,
}

impl PixTransferResult {
    pub fn from_upstream(raw: Value) -> Self {
        let id = match raw.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let status = raw
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PIX_STATUS)
            .to_string();

        Self { id, status, raw }
    }
}

// =============================================================================
// Sandbox items
// =============================================================================

/// Connector credentials for a sandbox item; extra keys pass through
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxCredentials {
    #[serde(default = "default_sandbox_user")]
    pub user: String,
    #[serde(default = "default_sandbox_password")]
    pub password: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SandboxCredentials {
    fn default() -> Self {
        Self {
            user: default_sandbox_user(),
            password: default_sandbox_password(),
            extra: Map::new(),
        }
    }
}

fn default_sandbox_user() -> String {
    DEFAULT_SANDBOX_USER.to_string()
}

fn default_sandbox_password() -> String {
    DEFAULT_SANDBOX_PASSWORD.to_string()
}

fn default_connector_id() -> i64 {
    DEFAULT_SANDBOX_CONNECTOR_ID
}

/// Body of `POST /items` for sandbox connectors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxItemParams {
    #[serde(default = "default_connector_id")]
    pub connector_id: i64,
    #[serde(default)]
    pub parameters: SandboxCredentials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl Default for SandboxItemParams {
    fn default() -> Self {
        Self {
            connector_id: DEFAULT_SANDBOX_CONNECTOR_ID,
            parameters: SandboxCredentials::default(),
            webhook_url: None,
        }
    }
}

impl SandboxItemParams {
    pub fn validate(&self) -> Result<()> {
        let mut result = validate_positive(Some(self.connector_id), "connectorId");
        if let Some(url) = &self.webhook_url {
            result = result.merge(validate_http_url(url, "webhookUrl"));
        }
        result.into_result()
    }
}

/// Prefix and expiry of a freshly exchanged API key
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthDebugInfo {
    pub key_prefix: String,
    #[serde(rename = "expISO")]
    pub exp_iso: String,
}
