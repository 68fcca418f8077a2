//! API Middleware - Request Logging
//!
//! Tags every request with a correlation id and logs it on entry and exit.
//! Also holds the bearer secret check shared by protected routes.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Instant;

use crate::common::logging::{generate_correlation_id, log_api_request, log_api_response};

pub const CORRELATION_HEADER: &str = "x-correlation-id";

type HmacSha256 = Hmac<Sha256>;

const SECRET_MAC_KEY: &[u8] = b"pluggy-gateway bearer secret";

/// Request logging middleware
///
/// Reuses an inbound `x-correlation-id` when present and echoes it on the response.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generate_correlation_id);

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let client_ip = extract_client_ip(request.headers());

    log_api_request(&method, &path, client_ip.as_deref(), &correlation_id);

    let started = Instant::now();
    let mut response = next.run(request).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    log_api_response(
        &method,
        &path,
        response.status().as_u16(),
        duration_ms,
        &correlation_id,
    );

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }

    response
}

/// Extract client IP from request headers
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    // Proxied requests: first hop of X-Forwarded-For
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            return Some(value.split(',').next()?.trim().to_string());
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            return Some(value.to_string());
        }
    }

    None
}

/// Compare a presented secret with the configured one in constant time
///
/// Both sides are reduced to HMAC tags first, so neither the content nor
/// the length of `expected` shows up in the timing.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(SECRET_MAC_KEY) else {
        return false;
    };
    mac.update(expected.as_bytes());
    let expected_tag = mac.finalize().into_bytes();

    let Ok(mut mac) = HmacSha256::new_from_slice(SECRET_MAC_KEY) else {
        return false;
    };
    mac.update(provided.as_bytes());
    mac.verify_slice(&expected_tag).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cr3t-key", "s3cr3t-key"));
        assert!(!secrets_match("s3cr3t-kez", "s3cr3t-key"));
        assert!(!secrets_match("s3cr3t", "s3cr3t-key"));
        assert!(!secrets_match("s3cr3t-key-and-more", "s3cr3t-key"));
        assert!(!secrets_match("", "s3cr3t-key"));
    }

    #[test]
    fn test_extract_client_ip() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers), None);

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("10.0.0.2"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }
}
