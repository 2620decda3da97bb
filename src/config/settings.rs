//! Triage settings and configuration types.
//!
//! Settings are read from the file named by `INBOX_TRIAGE_CONFIG`, or from
//! `settings.json` in the user's config directory (XDG or platform
//! equivalent). Every field has a default, so a partial file or no file at
//! all is fine.

use anyhow::{anyhow, bail, Context};
use chrono::FixedOffset;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the settings file location.
pub const CONFIG_ENV_VAR: &str = "INBOX_TRIAGE_CONFIG";

/// Top-level triage settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// OAuth files and scopes.
    pub auth: AuthSettings,
    /// Inbox listing and message decoding.
    pub mail: MailSettings,
    /// Availability lookups.
    pub calendar: CalendarSettings,
    /// Datetime extraction.
    pub extraction: ExtractionSettings,
    /// Language model used by the classifier and composer.
    pub ai: AiSettings,
}

impl Settings {
    /// Loads settings from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing settings in {}", path.display()))
    }

    /// Loads settings from the configured location, falling back to defaults
    /// when no file exists there.
    pub fn load_or_default() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&path));
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Returns `settings.json` inside the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "inbox-triage")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }
}

/// OAuth configuration for the Google account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// OAuth client secrets downloaded from the Google console.
    /// Only read when no usable cached token exists.
    pub client_secrets_path: PathBuf,
    /// Where the credential record is cached between runs.
    pub token_cache_path: PathBuf,
    /// Scopes requested at consent and required of a cached token.
    pub scopes: Vec<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            client_secrets_path: PathBuf::from("credentials.json"),
            token_cache_path: PathBuf::from("token.json"),
            scopes: vec![
                "https://www.googleapis.com/auth/gmail.readonly".to_string(),
                "https://www.googleapis.com/auth/gmail.compose".to_string(),
                "https://www.googleapis.com/auth/calendar.readonly".to_string(),
            ],
        }
    }
}

/// Inbox listing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    /// Number of recent messages processed per run.
    pub batch_size: u32,
    /// Labels a message must carry to be listed.
    pub label_ids: Vec<String>,
    /// Body text is cut to this many characters.
    pub body_char_limit: usize,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            batch_size: 3,
            label_ids: vec!["INBOX".to_string(), "CATEGORY_PERSONAL".to_string()],
            body_char_limit: 2000,
        }
    }
}

/// Calendar lookup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Calendar queried for conflicts.
    pub calendar_id: String,
    /// Length of the probed window after the requested start.
    pub meeting_duration_minutes: i64,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            calendar_id: "primary".to_string(),
            meeting_duration_minutes: 60,
        }
    }
}

/// Datetime extraction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// UTC offset attached to every extracted datetime, as `±HH:MM`.
    pub local_offset: String,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            local_offset: "+05:45".to_string(),
        }
    }
}

impl ExtractionSettings {
    /// Parses [`local_offset`](Self::local_offset).
    pub fn offset(&self) -> anyhow::Result<FixedOffset> {
        parse_utc_offset(&self.local_offset)
    }
}

/// Language model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature (0.0 to 1.0).
    pub temperature: f32,
    /// Custom OpenAI-compatible endpoint. Uses api.openai.com when unset.
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Keychain identifier consulted when the environment variable is unset.
    pub api_key_keychain_id: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo".to_string(),
            temperature: 0.3,
            base_url: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key_keychain_id: "ai.api_key.openai".to_string(),
        }
    }
}

/// Parses an offset such as `+05:45`, `-08:00` or `Z`.
pub fn parse_utc_offset(value: &str) -> anyhow::Result<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(|| anyhow!("invalid offset {value:?}"));
    }

    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => bail!("offset {value:?} must start with '+' or '-'"),
    };

    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(|| anyhow!("offset {value:?} must look like +HH:MM"))?;
    let hours: i32 = hours
        .parse()
        .with_context(|| format!("invalid hours in offset {value:?}"))?;
    let minutes: i32 = minutes
        .parse()
        .with_context(|| format!("invalid minutes in offset {value:?}"))?;
    if minutes >= 60 {
        bail!("invalid minutes in offset {value:?}");
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| anyhow!("offset {value:?} is out of range"))
}
