//! Input validation helpers shared by request types and route adapters.

use super::error::GatewayError;

/// Validation result
#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            errors: vec![msg.into()],
        }
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.is_valid = self.is_valid && other.is_valid;
        self.errors.extend(other.errors);
        self
    }

    /// Collapse into a `GatewayError::Validation` listing every failure
    pub fn into_result(self) -> Result<(), GatewayError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(GatewayError::Validation(self.errors.join("; ")))
        }
    }
}

/// Validate a required, non-empty string field
pub fn validate_non_empty(value: &str, field_name: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return ValidationResult::error(format!("{} is required", field_name));
    }
    ValidationResult::ok()
}

/// Validate a strictly positive, finite amount
pub fn validate_positive_amount(amount: f64, field_name: &str) -> ValidationResult {
    if !amount.is_finite() || amount <= 0.0 {
        return ValidationResult::error(format!("{} must be greater than 0", field_name));
    }
    ValidationResult::ok()
}

/// Validate an optional positive integer query parameter
pub fn validate_positive<T>(value: Option<T>, field_name: &str) -> ValidationResult
where
    T: PartialOrd + Default,
{
    match value {
        Some(v) if v <= T::default() => {
            ValidationResult::error(format!("{} must be a positive integer", field_name))
        }
        _ => ValidationResult::ok(),
    }
}

/// Validate a caller-supplied id that becomes one upstream path segment
///
/// Separators are percent-encoded later; dot segments cannot be.
pub fn validate_path_segment(value: &str, field_name: &str) -> ValidationResult {
    match value {
        "" => ValidationResult::error(format!("{} is required", field_name)),
        "." | ".." => ValidationResult::error(format!("{} is not a valid id", field_name)),
        _ => ValidationResult::ok(),
    }
}

/// Validate an absolute http(s) URL
pub fn validate_http_url(value: &str, field_name: &str) -> ValidationResult {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            ValidationResult::ok()
        }
        _ => ValidationResult::error(format!("{} must be a valid http(s) URL", field_name)),
    }
}
