//! Domain layer types for inbox triage.
//!
//! Messages and replies, the OAuth credential record, and the typed
//! per-message triage outcome.

mod credential;
mod email;
mod triage;
mod types;

pub use credential::{CredentialRecord, GOOGLE_TOKEN_URI};
pub use email::{Address, Message, ReplyPayload, NO_SUBJECT, UNKNOWN_SENDER};
pub use triage::{TriageOutcome, TriageStage, UrgencyLabel};
pub use types::{EmailId, ThreadId};
