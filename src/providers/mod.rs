//! Mail, calendar and AI provider implementations.
//!
//! This module contains provider traits and implementations for external services:
//!
//! - [`email`] - Mail gateway (Gmail API)
//! - [`calendar`] - Calendar gateway (Google Calendar API)
//! - [`ai`] - AI/LLM providers (OpenAI-compatible endpoints)
//! - [`oauth`] - Google OAuth refresh and installed-app consent

pub mod ai;
pub mod calendar;
pub mod email;
mod error;
mod google;
pub mod oauth;

pub use error::{ProviderError, Result};
