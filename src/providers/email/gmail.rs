//! Gmail API gateway implementation.
//!
//! This module provides a [`MailGateway`] implementation using the Gmail REST
//! API v1 with an OAuth 2.0 bearer token obtained by the credential provider.
//!
//! # API Usage
//!
//! - `users.messages.list` for the recent inbox listing
//! - `users.messages.get` (`format=full`) for bodies
//! - `users.messages.get` (`format=metadata`) for reply headers
//! - `users.drafts.create` for urgent reply drafts
//! - `users.messages.send` for availability replies

use async_trait::async_trait;
use base64::prelude::*;
use serde::{Deserialize, Serialize};

use super::MailGateway;
use crate::config::MailSettings;
use crate::domain::{EmailId, Message, ReplyPayload, ThreadId, NO_SUBJECT, UNKNOWN_SENDER};
use crate::providers::error::Result;
use crate::providers::google::GoogleApiClient;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail API message list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    messages: Option<Vec<MessageRef>>,
    #[allow(dead_code)]
    result_size_estimate: Option<u32>,
}

/// Message reference returned by `messages.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRef {
    id: String,
    #[allow(dead_code)]
    thread_id: Option<String>,
}

/// Gmail API message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    thread_id: String,
    payload: Option<GmailMessagePayload>,
}

/// Gmail message payload (headers and body parts).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessagePayload {
    headers: Option<Vec<GmailHeader>>,
    parts: Option<Vec<GmailPart>>,
    body: Option<GmailBody>,
    #[allow(dead_code)]
    mime_type: Option<String>,
}

/// Gmail message header.
#[derive(Debug, Deserialize)]
struct GmailHeader {
    name: String,
    value: String,
}

/// Gmail message part (for multipart messages).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailPart {
    mime_type: Option<String>,
    body: Option<GmailBody>,
    parts: Option<Vec<GmailPart>>,
}

/// Gmail message body.
#[derive(Debug, Deserialize)]
struct GmailBody {
    data: Option<String>,
}

/// Raw RFC 5322 message bound to a thread. Used as the send body and
/// wrapped in [`DraftRequest`] for drafts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    raw: String,
    thread_id: String,
}

#[derive(Debug, Serialize)]
struct DraftRequest {
    message: RawMessage,
}

/// Resource created by `drafts.create` or `messages.send`.
#[derive(Debug, Deserialize)]
struct CreatedResource {
    id: String,
}

impl From<&ReplyPayload> for RawMessage {
    fn from(reply: &ReplyPayload) -> Self {
        Self {
            raw: reply.encode_raw(),
            thread_id: reply.thread_id.0.clone(),
        }
    }
}

/// Gmail API gateway.
///
/// Implements [`MailGateway`] using the Gmail REST API. The gateway never
/// refreshes tokens itself; it is constructed from an access token that is
/// valid for the run.
///
/// # Example
///
/// ```ignore
/// use inbox_triage::providers::email::{GmailGateway, MailGateway};
///
/// let gateway = GmailGateway::new(&record.token);
/// let ids = gateway.list_recent(3).await?;
/// ```
pub struct GmailGateway {
    api: GoogleApiClient,
    label_ids: Vec<String>,
    body_char_limit: usize,
}

impl GmailGateway {
    /// Creates a gateway with the default labels and body budget.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::from_settings(access_token, &MailSettings::default())
    }

    /// Creates a gateway using the configured labels and body budget.
    pub fn from_settings(access_token: impl Into<String>, settings: &MailSettings) -> Self {
        Self {
            api: GoogleApiClient::new(GMAIL_API_BASE, access_token),
            label_ids: settings.label_ids.clone(),
            body_char_limit: settings.body_char_limit,
        }
    }

    /// Overrides the HTTP client (useful for custom timeouts or proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.api = self.api.with_client(client);
        self
    }

    async fn get_message(&self, id: &EmailId, query: &[(&str, &str)]) -> Result<GmailMessage> {
        self.api.get(&format!("/messages/{}", id), query).await
    }

    /// Looks up the original headers and builds the reply to it.
    async fn build_reply(&self, id: &EmailId, body: &str) -> Result<ReplyPayload> {
        let original = self
            .get_message(
                id,
                &[
                    ("format", "metadata"),
                    ("metadataHeaders", "Subject"),
                    ("metadataHeaders", "From"),
                ],
            )
            .await?;

        let payload = original.payload.as_ref();
        let subject = payload
            .and_then(|p| Self::header(p, "Subject"))
            .unwrap_or_default();
        let from = payload
            .and_then(|p| Self::header(p, "From"))
            .unwrap_or_default();

        Ok(ReplyPayload::in_reply_to(
            &subject,
            &from,
            body,
            ThreadId::from(original.thread_id),
        ))
    }

    /// Returns the first header with the given name, ignoring case.
    fn header(payload: &GmailMessagePayload, name: &str) -> Option<String> {
        payload.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|hdr| hdr.name.eq_ignore_ascii_case(name))
                .map(|hdr| hdr.value.clone())
        })
    }

    /// Decodes base64url body data, with or without padding.
    fn decode_body_data(data: &str) -> Option<String> {
        BASE64_URL_SAFE_NO_PAD
            .decode(data.trim_end_matches('='))
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Extracts the plain text body from a Gmail message payload.
    ///
    /// Multipart messages use their first `text/plain` leaf; single-part
    /// messages use the payload body directly.
    fn extract_body(payload: &GmailMessagePayload) -> String {
        if let Some(parts) = &payload.parts {
            return Self::first_plain_text(parts).unwrap_or_default();
        }

        payload
            .body
            .as_ref()
            .and_then(|body| body.data.as_deref())
            .and_then(Self::decode_body_data)
            .unwrap_or_default()
    }

    /// Depth-first search for the first decodable `text/plain` part.
    fn first_plain_text(parts: &[GmailPart]) -> Option<String> {
        parts.iter().find_map(|part| {
            let is_plain = part
                .mime_type
                .as_deref()
                .is_some_and(|mime| mime.eq_ignore_ascii_case("text/plain"));

            let direct = if is_plain {
                part.body
                    .as_ref()
                    .and_then(|body| body.data.as_deref())
                    .and_then(Self::decode_body_data)
            } else {
                None
            };

            direct.or_else(|| part.parts.as_deref().and_then(Self::first_plain_text))
        })
    }

    /// Converts a Gmail message to our domain Message type.
    fn to_message(&self, msg: GmailMessage) -> Message {
        let (subject, sender, body) = match msg.payload.as_ref() {
            Some(payload) => (
                Self::header(payload, "Subject"),
                Self::header(payload, "From"),
                Self::extract_body(payload),
            ),
            None => (None, None, String::new()),
        };

        Message {
            id: EmailId::from(msg.id),
            thread_id: ThreadId::from(msg.thread_id),
            subject: subject.unwrap_or_else(|| NO_SUBJECT.to_string()),
            sender: sender.unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
            body: truncate_chars(&body, self.body_char_limit),
        }
    }
}

/// Keeps at most `limit` characters of `text`.
fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[async_trait]
impl MailGateway for GmailGateway {
    async fn list_recent(&self, max_results: u32) -> Result<Vec<EmailId>> {
        let max_results = max_results.to_string();
        let mut query = vec![("maxResults", max_results.as_str())];
        query.extend(self.label_ids.iter().map(|label| ("labelIds", label.as_str())));

        let response: MessageListResponse = self.api.get("/messages", &query).await?;

        Ok(response
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| EmailId::from(m.id))
            .collect())
    }

    async fn fetch(&self, id: &EmailId) -> Result<Message> {
        let msg = self.get_message(id, &[("format", "full")]).await?;
        Ok(self.to_message(msg))
    }

    async fn create_draft(&self, id: &EmailId, body: &str) -> Result<()> {
        let reply = self.build_reply(id, body).await?;
        let request = DraftRequest {
            message: RawMessage::from(&reply),
        };

        let draft: CreatedResource = self.api.post("/drafts", &request).await?;

        tracing::info!(
            draft_id = %draft.id,
            thread_id = %reply.thread_id,
            "Draft created via Gmail API"
        );
        Ok(())
    }

    async fn send_reply(&self, id: &EmailId, body: &str) -> Result<()> {
        let reply = self.build_reply(id, body).await?;

        let sent: CreatedResource = self
            .api
            .post("/messages/send", &RawMessage::from(&reply))
            .await?;

        tracing::info!(
            message_id = %sent.id,
            thread_id = %reply.thread_id,
            "Reply sent via Gmail API"
        );
        Ok(())
    }
}
