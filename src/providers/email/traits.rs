//! Mail gateway trait definition.
//!
//! This module defines the [`MailGateway`] trait which abstracts over the
//! remote mailbox the triage service reads from and replies through. The
//! Gmail implementation lives in [`super::GmailGateway`]; tests substitute
//! in-memory fakes.

use async_trait::async_trait;

use crate::domain::{EmailId, Message};
use crate::providers::error::Result;

/// Read and reply access to a single mailbox.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailGateway: Send + Sync {
    /// Lists the most recent messages in the triaged labels.
    ///
    /// # Arguments
    ///
    /// * `max_results` - Upper bound on the number of ids returned
    ///
    /// # Returns
    ///
    /// Message ids ordered newest first.
    async fn list_recent(&self, max_results: u32) -> Result<Vec<EmailId>>;

    /// Fetches a message with its decoded, truncated plain text body.
    ///
    /// # Arguments
    ///
    /// * `id` - Message to fetch
    ///
    /// # Returns
    ///
    /// A [`Message`] with placeholder subject/sender when the headers are missing.
    async fn fetch(&self, id: &EmailId) -> Result<Message>;

    /// Saves a reply to the message as a draft in the same thread.
    ///
    /// # Arguments
    ///
    /// * `id` - Message being answered
    /// * `body` - Reply body text
    async fn create_draft(&self, id: &EmailId, body: &str) -> Result<()>;

    /// Sends a reply to the message immediately, in the same thread.
    ///
    /// # Arguments
    ///
    /// * `id` - Message being answered
    /// * `body` - Reply body text
    async fn send_reply(&self, id: &EmailId, body: &str) -> Result<()>;
}
