//! Triage decisions and per-message outcomes.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary urgency label produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLabel {
    Urgent,
    NotUrgent,
}

impl UrgencyLabel {
    /// Interprets a model response.
    ///
    /// Only a response that starts with "urgent" (ignoring case and
    /// surrounding whitespace) is urgent; anything else, including
    /// "not urgent" and malformed output, is not.
    pub fn from_response(text: &str) -> Self {
        if text.trim().to_lowercase().starts_with("urgent") {
            Self::Urgent
        } else {
            Self::NotUrgent
        }
    }

    pub fn is_urgent(self) -> bool {
        self == Self::Urgent
    }
}

/// The step at which processing of a message failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageStage {
    AvailabilityCheck,
    SendReply,
    Classification,
    Composition,
    CreateDraft,
}

impl fmt::Display for TriageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AvailabilityCheck => "checking calendar availability",
            Self::SendReply => "sending reply",
            Self::Classification => "classifying urgency",
            Self::Composition => "composing draft",
            Self::CreateDraft => "creating draft",
        };
        f.write_str(name)
    }
}

/// What happened to a single message. Exactly one per processed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriageOutcome {
    /// A scheduling question was answered with calendar availability.
    AvailabilityReplySent {
        requested: DateTime<FixedOffset>,
        slot_free: bool,
    },
    /// The message was urgent and a reply draft was saved.
    DraftCreated,
    /// The message was not urgent.
    NoAction,
    /// A remote call failed; the message is not retried.
    Failed { stage: TriageStage, error: String },
}

impl TriageOutcome {
    pub fn failed(stage: TriageStage, error: impl fmt::Display) -> Self {
        Self::Failed {
            stage,
            error: error.to_string(),
        }
    }
}

impl fmt::Display for TriageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AvailabilityReplySent { requested, slot_free } => write!(
                f,
                "Reply (calendar availability) sent for {} ({})",
                requested.to_rfc3339(),
                if *slot_free { "free" } else { "booked" }
            ),
            Self::DraftCreated => f.write_str("Draft created successfully"),
            Self::NoAction => f.write_str("Not urgent, skipping"),
            Self::Failed { stage, error } => write!(f, "Error {}: {}", stage, error),
        }
    }
}
