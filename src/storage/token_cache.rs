//! On-disk cache for the OAuth credential record.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::CredentialRecord;

/// Errors that can occur while reading or writing the token cache.
#[derive(Debug, Error)]
pub enum TokenCacheError {
    #[error("token cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token cache at {path} is not valid json: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for token cache operations.
pub type Result<T> = std::result::Result<T, TokenCacheError>;

/// JSON file holding a single [`CredentialRecord`].
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached record. A missing file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<CredentialRecord>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(TokenCacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| TokenCacheError::Json {
                path: self.path.clone(),
                source,
            })
    }

    /// Writes the record, replacing any previous one.
    ///
    /// On Unix the file is readable and writable by the owner only.
    pub fn save(&self, record: &CredentialRecord) -> Result<()> {
        let io_err = |source| TokenCacheError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(record).map_err(|source| TokenCacheError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(io_err)?;
        }

        tracing::debug!(path = %self.path.display(), "Saved token cache");
        Ok(())
    }
}
