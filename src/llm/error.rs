//! Typed errors for LLM calls

use thiserror::Error;

/// LLM call errors.
///
/// Calls are never retried here; the variants exist so the failure message
/// that reaches the user says what went wrong.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key in the configured environment variable
    #[error("API key not set: export {0} or use the offline reasoner")]
    MissingApiKey(String),

    /// HTTP 401
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP 429
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// HTTP 400
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 5xx
    #[error("Service error: {0}")]
    ServiceError(String),

    /// Connection refused, timeout and similar
    #[error("Network error: {0}")]
    Network(String),

    /// The model answered, but not in a usable shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl LlmError {
    /// Convert HTTP status code and error text into typed LlmError
    pub fn from_http_status(status: reqwest::StatusCode, error_text: String) -> Self {
        match status.as_u16() {
            401 => LlmError::Unauthorized(error_text),
            429 => LlmError::RateLimited(error_text),
            400 => LlmError::BadRequest(error_text),
            500..=599 => LlmError::ServiceError(error_text),
            _ => LlmError::Other(anyhow::anyhow!("HTTP {}: {}", status, error_text)),
        }
    }

    /// Convert network/connection errors into typed LlmError
    pub fn from_network_error(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            LlmError::Network(format!("Connection failed: {}", e))
        } else if let Some(status) = e.status() {
            Self::from_http_status(status, e.to_string())
        } else if e.is_decode() {
            LlmError::InvalidResponse(e.to_string())
        } else {
            LlmError::Other(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        let err = LlmError::from_http_status(
            reqwest::StatusCode::UNAUTHORIZED,
            "Invalid token".to_string(),
        );
        assert!(matches!(err, LlmError::Unauthorized(_)));

        let err = LlmError::from_http_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded".to_string(),
        );
        assert!(matches!(err, LlmError::RateLimited(_)));

        let err =
            LlmError::from_http_status(reqwest::StatusCode::BAD_GATEWAY, "upstream".to_string());
        assert!(matches!(err, LlmError::ServiceError(_)));

        let err = LlmError::from_http_status(reqwest::StatusCode::IM_A_TEAPOT, "tea".to_string());
        assert!(err.to_string().contains("418"));
    }

    #[test]
    fn test_missing_key_message_names_variable() {
        let err = LlmError::MissingApiKey("OPENAI_API_KEY".to_string());
        assert_eq!(
            err.to_string(),
            "API key not set: export OPENAI_API_KEY or use the offline reasoner"
        );
    }
}
