//! Calendar gateway trait definition.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::providers::error::Result;

/// Default length of the probed window, in minutes.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Free/busy lookups against the account's calendar.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Returns true if no event overlaps `[start, start + duration_minutes)`.
    async fn is_free(&self, start: DateTime<FixedOffset>, duration_minutes: i64) -> Result<bool>;
}
