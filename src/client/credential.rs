//! Cached upstream credential

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::common::error::{GatewayError, Result};

/// A credential is only used while it expires more than this far in the future
pub const EXPIRY_MARGIN_SECS: i64 = 30;

/// Lifetime assumed when `/auth` does not report `expiresAt`
pub const DEFAULT_TTL_MINUTES: i64 = 100;

/// Body of a successful `POST /auth`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub api_key: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Body sent to `POST /auth`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

/// API key plus its expiry, replaced wholesale on refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Build from an `/auth` response received at `now`
    pub fn from_auth_response(resp: AuthResponse, now: DateTime<Utc>) -> Result<Self> {
        let expires_at = match resp.expires_at.as_deref() {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| GatewayError::decode(format!("invalid expiresAt '{}': {}", raw, e)))?,
            None => now + Duration::minutes(DEFAULT_TTL_MINUTES),
        };

        Ok(Self::new(resp.api_key, expires_at))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// First 8 characters of the key, the only part that is ever logged
    pub fn key_prefix(&self) -> String {
        self.token.chars().take(8).collect()
    }

    /// Expiry formatted like `2025-08-16T12:00:00.000Z`
    pub fn expires_iso(&self) -> String {
        self.expires_at
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && self.expires_at > now + Duration::seconds(EXPIRY_MARGIN_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_respects_margin() {
        let now = Utc::now();
        assert!(Credential::new("key", now + Duration::seconds(31)).is_valid_at(now));
        assert!(!Credential::new("key", now + Duration::seconds(30)).is_valid_at(now));
        assert!(!Credential::new("key", now + Duration::seconds(10)).is_valid_at(now));
        assert!(!Credential::new("key", now - Duration::seconds(1)).is_valid_at(now));
        assert!(!Credential::new("", now + Duration::hours(1)).is_valid_at(now));
    }

    #[test]
    fn test_default_ttl_when_expiry_missing() {
        let now = Utc::now();
        let credential = Credential::from_auth_response(
            AuthResponse {
                api_key: "abcdefghijkl".to_string(),
                expires_at: None,
            },
            now,
        )
        .unwrap();

        assert_eq!(credential.expires_at(), now + Duration::minutes(100));
        assert_eq!(credential.key_prefix(), "abcdefgh");
    }

    #[test]
    fn test_parses_reported_expiry() {
        let credential = Credential::from_auth_response(
            AuthResponse {
                api_key: "key".to_string(),
                expires_at: Some("2030-01-01T00:00:00.000Z".to_string()),
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(credential.expires_iso(), "2030-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_rejects_garbled_expiry() {
        let result = Credential::from_auth_response(
            AuthResponse {
                api_key: "key".to_string(),
                expires_at: Some("tomorrow".to_string()),
            },
            Utc::now(),
        );

        assert!(matches!(result, Err(GatewayError::Decode(_))));
    }
}
