//! Local persistence.
//!
//! - [`TokenCache`] keeps the OAuth credential record between runs.
//! - [`Keychain`] reads the language model API key from the OS keychain.

pub mod keychain;
pub mod token_cache;

pub use keychain::{
    resolve_api_key, resolve_api_key_with, resolve_optional_api_key, Keychain, KeychainError,
};
pub use token_cache::{TokenCache, TokenCacheError};
