//! Environment-based Configuration for the Pluggy Gateway
//!
//! All values come from environment variables (optionally loaded from a
//! `.env` file by the binary). Credentials are never hardcoded.
//!
//! # Environment Variables
//!
//! ## Upstream
//! - `PLUGGY_BASE_URL` - Pluggy API base URL (default: "https://api.pluggy.ai")
//! - `PLUGGY_CLIENT_ID` - Client id used for the `/auth` exchange
//! - `PLUGGY_SECRET` - Client secret used for the `/auth` exchange
//! - `UPSTREAM_TIMEOUT_SECS` - Per-request timeout (default: 30)
//!
//! ## Gateway
//! - `PORT` - Listening port (default: 3002)
//! - `API_SECRET_KEY` - Shared bearer secret for `POST /pix/transfer` (empty disables the check)
//! - `BACKEND_URL` - Self URL used by the enrichment pass-through (default: "http://localhost:3002")
//!
//! ## Logging
//! - `LOG_LEVEL` - trace, debug, info, warn, error (default: "info")
//! - `LOG_FORMAT` - "pretty" or "json" (default: "pretty")

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use super::logging::mask_secret;

pub const DEFAULT_BASE_URL: &str = "https://api.pluggy.ai";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3002";
pub const DEFAULT_PORT: u16 = 3002;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue(
                "LOG_FORMAT".to_string(),
                format!("unknown format: {} (use 'pretty' or 'json')", s),
            )),
        }
    }
}

/// Credentials and location of the upstream aggregation API
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl UpstreamConfig {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn has_client_id(&self) -> bool {
        !self.client_id.is_empty()
    }

    pub fn has_secret(&self) -> bool {
        !self.client_secret.is_empty()
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listening port
    pub port: u16,

    /// Upstream API settings
    pub upstream: UpstreamConfig,

    /// Shared secret required on the PIX endpoint (None disables the check)
    pub api_secret_key: Option<String>,

    /// Self URL for the enrichment pass-through
    pub backend_url: String,

    /// Timeout applied to every upstream call
    pub upstream_timeout: Duration,

    /// Log level
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or_default(&lookup, "PORT", DEFAULT_PORT)?;

        let upstream = UpstreamConfig::new(
            lookup("PLUGGY_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            lookup("PLUGGY_CLIENT_ID").unwrap_or_default(),
            lookup("PLUGGY_SECRET").unwrap_or_default(),
        );

        let api_secret_key = lookup("API_SECRET_KEY").filter(|s| !s.is_empty());

        let backend_url = lookup("BACKEND_URL")
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = parse_or_default(
            &lookup,
            "UPSTREAM_TIMEOUT_SECS",
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "UPSTREAM_TIMEOUT_SECS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            port,
            upstream,
            api_secret_key,
            backend_url,
            upstream_timeout: Duration::from_secs(timeout_secs),
            log_level,
            log_format,
        })
    }

    /// True when either upstream credential is missing
    pub fn missing_credentials(&self) -> bool {
        !self.upstream.has_client_id() || !self.upstream.has_secret()
    }

    /// Print configuration summary (hiding sensitive values)
    pub fn print_summary(&self) {
        println!("=== Pluggy Gateway Configuration ===");
        println!("Port: {}", self.port);
        println!("Pluggy Base URL: {}", self.upstream.base_url);
        println!("Client ID: {}", mask_secret(&self.upstream.client_id, 4));
        println!("Client Secret: {}", mask_secret(&self.upstream.client_secret, 4));
        println!(
            "PIX Secret: {}",
            if self.api_secret_key.is_some() { "configured" } else { "disabled" }
        );
        println!("Backend URL: {}", self.backend_url);
        println!("Upstream Timeout: {}s", self.upstream_timeout.as_secs());
        println!("Log Level: {}", self.log_level);
        println!("====================================");
    }
}

fn parse_or_default<F, T>(lookup: &F, var_name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var_name) {
        Some(value) => value.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(var_name.to_string(), format!("not a number: {}", value))
        }),
        None => Ok(default),
    }
}
