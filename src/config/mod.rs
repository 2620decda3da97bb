//! Configuration and settings management.
//!
//! Settings are stored as JSON and every section falls back to built-in
//! defaults.

mod settings;

pub use settings::{
    parse_utc_offset, AiSettings, AuthSettings, CalendarSettings, ExtractionSettings,
    MailSettings, Settings, CONFIG_ENV_VAR,
};
