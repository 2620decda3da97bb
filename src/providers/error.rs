//! Error type shared by the mail and calendar gateways.

use serde::Deserialize;

/// 403 reasons Google uses for quota and rate limits rather than permissions.
const RATE_LIMIT_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "quotaExceeded",
    "dailyLimitExceeded",
];

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ErrorReason {
    #[serde(default)]
    reason: String,
}

/// True if a Google error body names a rate or quota limit.
fn names_rate_limit(body: &str) -> bool {
    serde_json::from_str::<ErrorEnvelope>(body).is_ok_and(|envelope| {
        envelope
            .error
            .errors
            .iter()
            .any(|e| RATE_LIMIT_REASONS.contains(&e.reason.as_str()))
    })
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur while talking to a remote mail or calendar API.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Authentication failed, credentials expired, or a scope is missing.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Rate limit or quota exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if known.
        retry_after_secs: Option<u64>,
    },

    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The API answered with something we could not interpret.
    #[error("provider error: {0}")]
    Provider(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Maps an unsuccessful HTTP status and its body to an error.
    pub fn from_status(status: u16, body: String, retry_after_secs: Option<u64>) -> Self {
        match status {
            400 => Self::InvalidRequest(body),
            403 if names_rate_limit(&body) => Self::RateLimited { retry_after_secs },
            401 | 403 => Self::Authentication(format!("unauthorized ({}): {}", status, body)),
            404 => Self::NotFound(body),
            429 => Self::RateLimited { retry_after_secs },
            _ => Self::Internal(format!("API error ({}): {}", status, body)),
        }
    }
}
