//! Email domain types.
//!
//! Represents the inbox snapshot the triage pass works on and the reply
//! messages it writes back.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use super::{EmailId, ThreadId};

/// Subject used when a message carries no `Subject` header.
pub const NO_SUBJECT: &str = "No Subject";

/// Sender used when a message carries no `From` header.
pub const UNKNOWN_SENDER: &str = "Unknown Sender";

/// A message fetched from the inbox for one processing pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Provider identifier for this message.
    pub id: EmailId,
    /// Conversation this message belongs to.
    pub thread_id: ThreadId,
    /// Subject line, or [`NO_SUBJECT`].
    pub subject: String,
    /// Raw `From` header value, or [`UNKNOWN_SENDER`].
    pub sender: String,
    /// Plain text body, already truncated to the configured budget.
    pub body: String,
}

/// An email address with optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Email address.
    pub email: String,
    /// Display name (e.g., "John Doe").
    pub name: Option<String>,
}

impl Address {
    #[cfg(test)]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    #[cfg(test)]
    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }

    /// Parses a header value such as `"Jane Roe" <jane@example.com>`.
    ///
    /// Bare addresses are accepted, and a trailing `(comment)` is dropped. An
    /// empty or unparseable header yields an address with an empty email.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if let Some(start) = value.find('<') {
            if let Some(len) = value[start..].find('>') {
                let email = value[start + 1..start + len].trim().to_string();
                let name = value[..start].trim().trim_matches('"').trim().to_string();
                return Self {
                    email,
                    name: if name.is_empty() { None } else { Some(name) },
                };
            }
        }

        let (email, comment) = match value.find('(') {
            Some(open) if value.ends_with(')') => (
                value[..open].trim(),
                Some(value[open + 1..value.len() - 1].trim()),
            ),
            _ => (value, None),
        };

        Self {
            email: email.to_string(),
            name: comment.filter(|c| !c.is_empty()).map(str::to_string),
        }
    }
}

/// A reply to an existing message, sent immediately or saved as a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    /// Bare destination address taken from the original sender.
    pub to: String,
    /// Reply subject, always `Re: ` followed by the original subject.
    pub subject: String,
    /// Reply body text.
    pub body: String,
    /// Thread of the message being answered.
    pub thread_id: ThreadId,
}

impl ReplyPayload {
    /// Builds a reply to the message with the given `Subject` and `From` headers.
    pub fn in_reply_to(
        original_subject: &str,
        original_sender: &str,
        body: impl Into<String>,
        thread_id: ThreadId,
    ) -> Self {
        Self {
            to: Address::parse(original_sender).email,
            subject: format!("Re: {}", original_subject),
            body: body.into(),
            thread_id,
        }
    }

    /// Renders the RFC 5322 message text.
    pub fn to_rfc5322(&self) -> String {
        format!(
            "To: {}\r\nSubject: {}\r\n\r\n{}",
            self.to, self.subject, self.body
        )
    }

    /// Renders the message as URL-safe base64, the form Gmail expects in `raw`.
    pub fn encode_raw(&self) -> String {
        BASE64_URL_SAFE.encode(self.to_rfc5322().as_bytes())
    }
}
