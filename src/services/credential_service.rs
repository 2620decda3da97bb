//! Credential provider for the Google account.
//!
//! Loads the cached credential record, refreshes it or runs interactive
//! consent when needed, and always writes the result back to the cache.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::CredentialRecord;
use crate::providers::oauth::{AuthError, OAuthClient};
use crate::storage::{TokenCache, TokenCacheError};

/// Errors that can occur while obtaining credentials. All of them are fatal
/// for the run.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Cache(#[from] TokenCacheError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Result type for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Produces a usable credential record for the configured scopes.
pub struct CredentialProvider {
    cache: TokenCache,
    oauth: Arc<dyn OAuthClient>,
    scopes: Vec<String>,
}

impl CredentialProvider {
    pub fn new(cache: TokenCache, oauth: Arc<dyn OAuthClient>, scopes: Vec<String>) -> Self {
        Self {
            cache,
            oauth,
            scopes,
        }
    }

    /// Returns a record that is valid now, persisting it before returning.
    pub async fn obtain(&self) -> CredentialResult<CredentialRecord> {
        let cached = self.cache.load()?.filter(|record| {
            let covered = record.covers(&self.scopes);
            if !covered {
                tracing::warn!(
                    path = %self.cache.path().display(),
                    "Cached token lacks required scopes, requesting consent again"
                );
            }
            covered
        });

        let record = match cached {
            Some(record) if !record.is_expired() => {
                tracing::debug!("Using cached access token");
                record
            }
            Some(record) if record.can_refresh() => {
                tracing::info!("Access token expired, refreshing");
                self.oauth.refresh(&record).await?
            }
            _ => {
                tracing::info!("No usable cached token, starting consent flow");
                self.oauth.consent(&self.scopes).await?
            }
        };

        self.cache.save(&record)?;
        Ok(record)
    }
}
