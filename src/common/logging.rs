//! Structured Logging for the Pluggy Gateway
//!
//! Provides structured logging with:
//! - JSON output for log aggregation
//! - Correlation IDs for request tracing
//! - Upstream call timings
//! - Security event logging
//!
//! Secrets never reach the log: client credentials go through
//! [`mask_secret`] and API keys are logged by prefix only.

use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use super::config::{GatewayConfig, LogFormat};

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Inbound API request/response events
    Api,
    /// Calls to the Pluggy API
    Upstream,
    /// Security events (shared secret checks)
    Security,
    /// System events (startup, shutdown)
    System,
}

/// Structured log event
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// Event timestamp (ISO 8601)
    pub timestamp: String,
    pub level: String,
    pub category: EventCategory,
    pub message: String,
    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    /// Create a new log event
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: format!("{:?}", level).to_uppercase(),
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            duration_ms: None,
            error: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": \"failed to serialize log\", \"message\": \"{}\"}}",
                self.message
            )
        })
    }
}

fn level_for_status(status: u16) -> LogLevel {
    if status >= 500 {
        LogLevel::Error
    } else if status >= 400 {
        LogLevel::Warn
    } else {
        LogLevel::Info
    }
}

fn emit(target_level: LogLevel, event: &LogEvent) {
    match target_level {
        LogLevel::Error => tracing::error!(target: "pluggy_gateway::events", "{}", event.to_json()),
        LogLevel::Warn => tracing::warn!(target: "pluggy_gateway::events", "{}", event.to_json()),
        LogLevel::Debug | LogLevel::Trace => {
            tracing::debug!(target: "pluggy_gateway::events", "{}", event.to_json())
        }
        LogLevel::Info => tracing::info!(target: "pluggy_gateway::events", "{}", event.to_json()),
    }
}

// ============================================================================
// Event Helpers
// ============================================================================

/// Log a security-related event
pub fn log_security_event(
    event_type: &str,
    success: bool,
    details: serde_json::Value,
    correlation_id: Option<&str>,
) {
    let level = if success { LogLevel::Info } else { LogLevel::Warn };
    let mut event = LogEvent::new(level, EventCategory::Security, event_type).with_data(
        serde_json::json!({
            "success": success,
            "details": details
        }),
    );

    if let Some(id) = correlation_id {
        event = event.with_correlation_id(id);
    }

    emit(level, &event);
}

/// Log an inbound API request
pub fn log_api_request(method: &str, path: &str, client_ip: Option<&str>, correlation_id: &str) {
    let event = LogEvent::new(LogLevel::Info, EventCategory::Api, format!("{} {}", method, path))
        .with_correlation_id(correlation_id)
        .with_data(serde_json::json!({
            "method": method,
            "path": path,
            "client_ip": client_ip
        }));

    emit(LogLevel::Info, &event);
}

/// Log an inbound API response
pub fn log_api_response(
    method: &str,
    path: &str,
    status: u16,
    duration_ms: u64,
    correlation_id: &str,
) {
    let level = level_for_status(status);
    let event = LogEvent::new(
        level,
        EventCategory::Api,
        format!("{} {} -> {}", method, path, status),
    )
    .with_correlation_id(correlation_id)
    .with_duration(duration_ms)
    .with_data(serde_json::json!({
        "method": method,
        "path": path,
        "status": status
    }));

    emit(level, &event);
}

/// Log a completed call to the Pluggy API
pub fn log_upstream_call(
    method: &str,
    path: &str,
    status: u16,
    duration_ms: u64,
    error_body: Option<&str>,
) {
    let level = if status >= 400 { LogLevel::Error } else { LogLevel::Debug };
    let mut event = LogEvent::new(
        level,
        EventCategory::Upstream,
        format!("{} {} -> {}", method, path, status),
    )
    .with_duration(duration_ms)
    .with_data(serde_json::json!({
        "method": method,
        "path": path,
        "status": status
    }));

    if let Some(body) = error_body {
        event = event.with_error("UPSTREAM_ERROR", body);
    }

    emit(level, &event);
}

/// Log a lifecycle event (startup, shutdown)
pub fn log_system_event(message: &str, data: serde_json::Value) {
    let event = LogEvent::new(LogLevel::Info, EventCategory::System, message).with_data(data);
    emit(LogLevel::Info, &event);
}

// ============================================================================
// Secret Masking
// ============================================================================

/// Mask a secret for display: `ab***wxyz`, short values untouched, empty as `(empty)`
pub fn mask_secret(secret: &str, keep: usize) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return "(empty)".to_string();
    }
    if chars.len() <= keep {
        return secret.to_string();
    }

    let head: String = chars.iter().take(2).collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{}***{}", head, tail)
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_filter();
        EnvFilter::new(format!(
            "pluggy_gateway={},tower_http={},axum={}",
            level, level, level
        ))
    });

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Initialize logging from GatewayConfig
pub fn init_from_config(config: &GatewayConfig) -> Result<(), LoggingError> {
    let level = LogLevel::from(config.log_level.as_str());
    init_logging(level, config.log_format == LogFormat::Json)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

/// Generate a unique correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
