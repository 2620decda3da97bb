//! Business services layer.
//!
//! Services orchestrate the providers and storage into the triage workflow:
//!
//! ```text
//!        main (wiring, progress output)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//! Providers (Gmail, Calendar, LLM, OAuth) and Storage (token cache, keychain)
//! ```
//!
//! # Services Overview
//!
//! - [`CredentialProvider`]: Produces a valid Google credential record
//! - [`DatetimeExtractor`]: Finds a requested meeting time in message text
//! - [`UrgencyClassifier`] / [`DraftComposer`]: Language model agents
//! - [`TriageService`]: Runs the per-message workflow over a batch

mod agent;
mod credential_service;
mod datetime_extractor;
mod draft_composer;
mod triage_service;
mod urgency_classifier;

pub use agent::{AgentProfile, TaskAgent};
pub use credential_service::{CredentialError, CredentialProvider, CredentialResult};
pub use datetime_extractor::{normalize_meridiem, DatetimeExtractor};
pub use draft_composer::DraftComposer;
pub use triage_service::{
    availability_reply, TriageEvent, TriageReport, TriageService, TriageSettings, TriageSummary,
    TriagedMessage, AVAILABLE_REPLY, BOOKED_REPLY,
};
pub use urgency_classifier::UrgencyClassifier;
