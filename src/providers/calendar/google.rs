//! Google Calendar API v3 gateway.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, SecondsFormat};
use serde::Deserialize;
use url::Url;

use super::CalendarGateway;
use crate::providers::error::{ProviderError, Result};
use crate::providers::google::GoogleApiClient;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Event list response. Only the number of items matters here.
#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<EventRef>,
}

#[derive(Debug, Deserialize)]
struct EventRef {
    #[allow(dead_code)]
    #[serde(default)]
    id: String,
}

/// Calendar gateway backed by `events.list`.
pub struct GoogleCalendarGateway {
    api: GoogleApiClient,
    calendar_id: String,
}

impl GoogleCalendarGateway {
    /// Creates a gateway for the account's primary calendar.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::for_calendar(access_token, "primary")
    }

    /// Creates a gateway for a specific calendar.
    pub fn for_calendar(access_token: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        Self {
            api: GoogleApiClient::new(CALENDAR_API_BASE, access_token),
            calendar_id: calendar_id.into(),
        }
    }

    /// Overrides the HTTP client (useful for custom timeouts or proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.api = self.api.with_client(client);
        self
    }

    /// `events.list` path for a calendar, relative to the API base.
    ///
    /// The id is percent-encoded as one path segment; shared and holiday
    /// calendar ids contain `#`.
    fn events_endpoint(calendar_id: &str) -> Result<String> {
        let mut url = Url::parse("https://calendar.invalid")
            .map_err(|e| ProviderError::Internal(format!("endpoint base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Internal("endpoint base cannot hold a path".into()))?
            .clear()
            .extend(["calendars", calendar_id, "events"]);
        Ok(url.path().to_string())
    }

    /// Query parameters for the events overlapping the probed window.
    ///
    /// Bounds keep the caller's offset instead of being converted to UTC.
    fn window_query(
        start: DateTime<FixedOffset>,
        duration_minutes: i64,
    ) -> [(&'static str, String); 4] {
        let end = start + Duration::minutes(duration_minutes);
        [
            ("timeMin", start.to_rfc3339_opts(SecondsFormat::Secs, false)),
            ("timeMax", end.to_rfc3339_opts(SecondsFormat::Secs, false)),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ]
    }
}

#[async_trait]
impl CalendarGateway for GoogleCalendarGateway {
    async fn is_free(&self, start: DateTime<FixedOffset>, duration_minutes: i64) -> Result<bool> {
        let query = Self::window_query(start, duration_minutes);
        let endpoint = Self::events_endpoint(&self.calendar_id)?;

        let response: EventListResponse = self.api.get(&endpoint, &query).await?;

        tracing::debug!(
            calendar_id = %self.calendar_id,
            start = %query[0].1,
            events = response.items.len(),
            "Checked calendar window"
        );
        Ok(response.items.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn window_keeps_local_offset() {
        let offset = FixedOffset::east_opt(5 * 3600 + 45 * 60).unwrap();
        let start = offset.with_ymd_and_hms(2026, 3, 6, 10, 0, 0).unwrap();

        let query = GoogleCalendarGateway::window_query(start, 60);
        assert_eq!(
            query,
            [
                ("timeMin", "2026-03-06T10:00:00+05:45".to_string()),
                ("timeMax", "2026-03-06T11:00:00+05:45".to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ]
        );
    }

    #[test]
    fn missing_items_means_no_events() {
        let response: EventListResponse =
            serde_json::from_str(r#"{"kind": "calendar#events"}"#).unwrap();
        assert!(response.items.is_empty());
    }

    #[test]
    fn items_are_counted() {
        let response: EventListResponse =
            serde_json::from_str(r#"{"items": [{"id": "e1"}, {"id": "e2"}]}"#).unwrap();
        assert_eq!(response.items.len(), 2);
    }

    #[test]
    fn calendar_id_is_one_encoded_segment() {
        let id = "en.usa#holiday@group.v.calendar.google.com";
        let endpoint = GoogleCalendarGateway::events_endpoint(id).unwrap();
        assert_eq!(
            endpoint,
            "/calendars/en.usa%23holiday@group.v.calendar.google.com/events"
        );

        let url = Url::parse(&format!("{}{}", CALENDAR_API_BASE, endpoint)).unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(
            url.path(),
            "/calendar/v3/calendars/en.usa%23holiday@group.v.calendar.google.com/events"
        );
    }

    #[test]
    fn slash_in_calendar_id_stays_inside_segment() {
        assert_eq!(
            GoogleCalendarGateway::events_endpoint("team/rota").unwrap(),
            "/calendars/team%2Frota/events"
        );
        assert_eq!(
            GoogleCalendarGateway::events_endpoint("primary").unwrap(),
            "/calendars/primary/events"
        );
    }

    #[test]
    fn primary_calendar_by_default() {
        let gateway = GoogleCalendarGateway::new("token");
        assert_eq!(gateway.calendar_id, "primary");
    }
}
