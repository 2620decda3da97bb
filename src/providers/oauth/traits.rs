//! OAuth client trait and errors.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::CredentialRecord;

/// Errors raised while obtaining or refreshing OAuth tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("client secrets not found at {0}")]
    SecretsNotFound(PathBuf),

    #[error("invalid client secrets: {0}")]
    InvalidSecrets(String),

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("authorization was denied: {0}")]
    Denied(String),

    #[error("oauth state mismatch")]
    StateMismatch,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for OAuth operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Issues and renews credential records.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// Exchanges the record's refresh token for a new access token.
    ///
    /// The returned record keeps the old refresh token when the server does
    /// not rotate it.
    async fn refresh(&self, record: &CredentialRecord) -> AuthResult<CredentialRecord>;

    /// Runs the interactive consent flow for the given scopes.
    ///
    /// Blocks until the user completes or denies consent in the browser.
    async fn consent(&self, scopes: &[String]) -> AuthResult<CredentialRecord>;
}
