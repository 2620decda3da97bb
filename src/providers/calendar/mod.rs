//! Calendar gateway implementations.
//!
//! - [`GoogleCalendarGateway`] - Google Calendar API v3

mod google;
mod traits;

pub use google::GoogleCalendarGateway;
#[cfg(test)]
pub use traits::MockCalendarGateway;
pub use traits::{CalendarGateway, DEFAULT_DURATION_MINUTES};
