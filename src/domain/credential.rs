//! OAuth credential record shared by the Gmail and Calendar gateways.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Google's OAuth 2.0 token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens are treated as expired this long before their actual expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Access/refresh token pair for the authenticated account.
///
/// The field names follow the authorized-user JSON layout written by Google's
/// client libraries, so an existing `token.json` can be reused as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Current access token.
    #[serde(alias = "access_token")]
    pub token: String,
    /// Long-lived refresh token, absent for some consent grants.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token endpoint used for refreshes.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// OAuth client the tokens were issued to.
    pub client_id: String,
    /// OAuth client secret, optional for public clients.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Scopes granted at consent time.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// When the access token stops being valid.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl CredentialRecord {
    /// Returns true if the access token is expired or about to expire.
    ///
    /// A record without an expiry is assumed valid.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a fixed clock.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_MARGIN_SECS) >= expiry,
            None => false,
        }
    }

    /// Returns true if a refresh token is available.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    /// Returns true if every required scope was granted.
    pub fn covers(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expiry: Option<DateTime<Utc>>) -> CredentialRecord {
        CredentialRecord {
            token: "ya29.token".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            client_id: "client.apps.googleusercontent.com".to_string(),
            client_secret: Some("secret".to_string()),
            scopes: vec!["scope-a".to_string(), "scope-b".to_string()],
            expiry,
        }
    }

    #[test]
    fn expiry_uses_safety_margin() {
        let now = Utc::now();
        assert!(record(Some(now + Duration::seconds(30))).is_expired_at(now));
        assert!(!record(Some(now + Duration::minutes(10))).is_expired_at(now));
        assert!(record(Some(now - Duration::minutes(1))).is_expired_at(now));
        assert!(!record(None).is_expired_at(now));
    }

    #[test]
    fn refresh_requires_non_empty_token() {
        let mut rec = record(None);
        assert!(rec.can_refresh());

        rec.refresh_token = Some(String::new());
        assert!(!rec.can_refresh());

        rec.refresh_token = None;
        assert!(!rec.can_refresh());
    }

    #[test]
    fn covers_checks_every_scope() {
        let rec = record(None);
        assert!(rec.covers(&["scope-a".to_string()]));
        assert!(!rec.covers(&["scope-a".to_string(), "scope-c".to_string()]));
    }

    #[test]
    fn reads_authorized_user_json() {
        let json = r#"{
            "token": "ya29.a0",
            "refresh_token": "1//0g",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "123.apps.googleusercontent.com",
            "client_secret": "shh",
            "scopes": ["https://www.googleapis.com/auth/gmail.readonly"],
            "universe_domain": "googleapis.com",
            "account": "",
            "expiry": "2026-01-05T10:00:00.123456Z"
        }"#;

        let rec: CredentialRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.token, "ya29.a0");
        assert_eq!(rec.scopes.len(), 1);
        assert!(rec.expiry.is_some());
    }

    #[test]
    fn accepts_access_token_alias_and_defaults() {
        let json = r#"{"access_token": "abc", "client_id": "id"}"#;
        let rec: CredentialRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.token, "abc");
        assert_eq!(rec.token_uri, GOOGLE_TOKEN_URI);
        assert!(!rec.can_refresh());
    }
}
