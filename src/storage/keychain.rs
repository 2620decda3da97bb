//! OS keychain lookups for the language model API key.
//!
//! keyring calls block, so each one runs on the blocking thread pool.

use std::future::Future;

use thiserror::Error;

/// Errors that can occur during keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("keychain task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for keychain operations.
pub type Result<T> = std::result::Result<T, KeychainError>;

/// Secrets stored under one keychain service name.
#[derive(Debug, Clone)]
pub struct Keychain {
    service: String,
}

impl Keychain {
    pub const DEFAULT_SERVICE: &'static str = "io.inbox-triage";

    /// Uses a separate service name, e.g. to keep tests away from real secrets.
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    #[cfg(test)]
    pub fn service(&self) -> &str {
        &self.service
    }

    async fn with_entry<T, F>(&self, key: &str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(keyring::Entry) -> Result<T> + Send + 'static,
    {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || op(keyring::Entry::new(&service, &key)?)).await?
    }

    /// Reads a secret. A missing entry is `Ok(None)`.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        })
        .await
    }

    /// Stores a secret, replacing any previous value.
    #[cfg(test)]
    pub async fn set(&self, key: &str, secret: &str) -> Result<()> {
        let secret = secret.to_string();
        self.with_entry(key, move |entry| Ok(entry.set_password(&secret)?))
            .await
    }
}

impl Default for Keychain {
    fn default() -> Self {
        Self::for_service(Self::DEFAULT_SERVICE)
    }
}

/// Looks up the API key: a non-blank environment variable first, then the
/// keychain entry.
pub async fn resolve_api_key(
    env_var: &str,
    keychain: &Keychain,
    keychain_key: &str,
) -> Result<Option<String>> {
    resolve_api_key_with(env_var, || keychain.get(keychain_key)).await
}

/// Same as [`resolve_api_key`] with the keychain read supplied by `lookup`,
/// which only runs when the environment variable is unset or blank.
pub async fn resolve_api_key_with<F, Fut>(env_var: &str, lookup: F) -> Result<Option<String>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<String>>>,
{
    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
        _ => lookup().await,
    }
}

/// Resolves a key that the endpoint may not need. A keychain failure, such
/// as no secret service on a headless host, is logged and treated as no key.
pub async fn resolve_optional_api_key<F, Fut>(env_var: &str, lookup: F) -> Option<String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<String>>>,
{
    match resolve_api_key_with(env_var, lookup).await {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!(error = %e, "Keychain unavailable, continuing without an API key");
            None
        }
    }
}
