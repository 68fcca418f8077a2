//! Common Error Types for the Pluggy Gateway
//!
//! Every layer folds into [`GatewayError`]. Upstream failures keep the
//! HTTP status and response body for diagnostics.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::client::transport::TransportError;

/// Root error type for the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// Credential exchange against `/auth` was rejected
    #[error("/auth failed ({status}): {body}")]
    UpstreamAuth { status: u16, body: String },

    /// Any other upstream call answered with a non-2xx status
    #[error("upstream {path} failed ({status}): {body}")]
    UpstreamRequest {
        status: u16,
        path: String,
        body: String,
    },

    #[error("malformed account reference '{0}': expected itemId_accountId")]
    MalformedReference(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("validation error: {0}")]
    Validation(String),

    /// The upstream could not be reached at all
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A success response did not carry the expected JSON
    #[error("decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Raw upstream response body, when the error came from an upstream status
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            GatewayError::UpstreamAuth { body, .. } | GatewayError::UpstreamRequest { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Config(_) => "CONFIG_ERROR",
            GatewayError::Logging(_) => "LOGGING_ERROR",
            GatewayError::UpstreamAuth { .. } => "UPSTREAM_AUTH_ERROR",
            GatewayError::UpstreamRequest { .. } => "UPSTREAM_REQUEST_ERROR",
            GatewayError::MalformedReference(_) => "MALFORMED_REFERENCE",
            GatewayError::Unauthorized => "UNAUTHORIZED",
            GatewayError::Validation(_) => "VALIDATION_ERROR",
            GatewayError::Transport(_) => "TRANSPORT_ERROR",
            GatewayError::Decode(_) => "DECODE_ERROR",
            GatewayError::Io(_) => "IO_ERROR",
        }
    }

    /// HTTP status used when the error reaches a route boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Validation(_) | GatewayError::MalformedReference(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

/// JSON error body returned by every route
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<&GatewayError> for ErrorResponse {
    fn from(err: &GatewayError) -> Self {
        ErrorResponse::new(err.to_string()).with_code(err.error_code())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
