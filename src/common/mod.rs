//! Common Infrastructure Module
//!
//! Shared utilities and configuration for the gateway.
//!
//! This module contains:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - Common error types
//! - Input validation helpers

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

// Re-exports for convenience
pub use config::{ConfigError, GatewayConfig, LogFormat, UpstreamConfig};
pub use error::{ErrorResponse, GatewayError, Result};
pub use logging::{
    generate_correlation_id, init_from_config, init_logging, log_api_request, log_api_response,
    log_security_event, log_system_event, log_upstream_call, mask_secret, EventCategory,
    LogEvent, LogLevel, LoggingError,
};
pub use validation::ValidationResult;
