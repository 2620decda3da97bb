//! Google OAuth 2.0 for installed applications.
//!
//! Consent uses the loopback flow: a one-shot listener on `127.0.0.1`
//! receives the browser redirect carrying the authorization code, which is
//! then exchanged (with PKCE) for an access/refresh token pair.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RefreshToken, RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use super::traits::{AuthError, AuthResult, OAuthClient};
use crate::domain::{CredentialRecord, GOOGLE_TOKEN_URI};

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Client secrets file as downloaded from the Google console.
#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: Option<ClientConfig>,
    web: Option<ClientConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct ClientConfig {
    client_id: String,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    auth_uri: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

fn parse_client_secrets(contents: &str) -> AuthResult<ClientConfig> {
    let secrets: ClientSecrets =
        serde_json::from_str(contents).map_err(|e| AuthError::InvalidSecrets(e.to_string()))?;
    secrets
        .installed
        .or(secrets.web)
        .ok_or_else(|| AuthError::InvalidSecrets("expected an \"installed\" or \"web\" section".into()))
}

/// Query parameters of the browser redirect.
#[derive(Debug, PartialEq, Eq)]
enum Redirect {
    Code { code: String, state: Option<String> },
    Error(String),
}

/// Parses an HTTP request line such as `GET /?code=..&state=.. HTTP/1.1`.
///
/// Returns `None` for requests that carry neither a code nor an error,
/// like a browser fetching `/favicon.ico`.
fn parse_redirect(request_line: &str) -> Option<Redirect> {
    let target = request_line.split_whitespace().nth(1)?;
    let url = Url::parse("http://127.0.0.1").ok()?.join(target).ok()?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    match (error, code) {
        (Some(error), _) => Some(Redirect::Error(error)),
        (None, Some(code)) if !code.is_empty() => Some(Redirect::Code { code, state }),
        _ => None,
    }
}

async fn respond(stream: &mut TcpStream, status: &str, message: &str) {
    let body = format!(
        "<html><body style=\"font-family: system-ui; text-align: center; padding: 40px;\">\
         <h2>{}</h2></body></html>",
        message
    );
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        tracing::debug!(error = %e, "Failed to answer browser");
    }
    let _ = stream.flush().await;
}

/// Accepts connections until the authorization redirect arrives.
async fn wait_for_code(listener: &TcpListener, expected_state: &CsrfToken) -> AuthResult<String> {
    loop {
        let (mut stream, _) = listener.accept().await?;

        let mut buffer = vec![0u8; 8192];
        let n = stream.read(&mut buffer).await?;
        let request = String::from_utf8_lossy(&buffer[..n]);

        match request.lines().next().and_then(parse_redirect) {
            None => {
                respond(&mut stream, "404 Not Found", "Waiting for authorization.").await;
            }
            Some(Redirect::Error(error)) => {
                respond(
                    &mut stream,
                    "200 OK",
                    "Authorization denied. You can close this tab.",
                )
                .await;
                return Err(AuthError::Denied(error));
            }
            Some(Redirect::Code { code, state }) => {
                if state.as_deref() != Some(expected_state.secret().as_str()) {
                    respond(&mut stream, "400 Bad Request", "Invalid authorization state.").await;
                    return Err(AuthError::StateMismatch);
                }
                respond(
                    &mut stream,
                    "200 OK",
                    "Authorization complete. You can close this tab.",
                )
                .await;
                return Ok(code);
            }
        }
    }
}

fn build_client(
    client_id: &str,
    client_secret: Option<&str>,
    auth_uri: &str,
    token_uri: &str,
) -> AuthResult<BasicClient> {
    let auth_url = AuthUrl::new(auth_uri.to_string())
        .map_err(|e| AuthError::InvalidSecrets(format!("auth_uri: {}", e)))?;
    let token_url = TokenUrl::new(token_uri.to_string())
        .map_err(|e| AuthError::InvalidSecrets(format!("token_uri: {}", e)))?;

    Ok(BasicClient::new(
        ClientId::new(client_id.to_string()),
        client_secret.map(|s| ClientSecret::new(s.to_string())),
        auth_url,
        Some(token_url),
    ))
}

fn describe_token_error<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> String
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => response.to_string(),
        other => other.to_string(),
    }
}

fn expiry_of(token: &BasicTokenResponse) -> Option<DateTime<Utc>> {
    token
        .expires_in()
        .and_then(|lifetime| Duration::from_std(lifetime).ok())
        .map(|lifetime| Utc::now() + lifetime)
}

fn scopes_of(token: &BasicTokenResponse) -> Option<Vec<String>> {
    token
        .scopes()
        .map(|scopes| scopes.iter().map(|s| s.as_str().to_string()).collect())
}

/// Google implementation of [`OAuthClient`].
pub struct GoogleOAuthClient {
    secrets_path: PathBuf,
}

impl GoogleOAuthClient {
    /// Creates a client that reads consent secrets from `secrets_path`.
    ///
    /// The file is only read when consent is actually needed.
    pub fn new(secrets_path: impl Into<PathBuf>) -> Self {
        Self {
            secrets_path: secrets_path.into(),
        }
    }

    fn load_secrets(&self) -> AuthResult<ClientConfig> {
        let contents = match std::fs::read_to_string(&self.secrets_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::SecretsNotFound(self.secrets_path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        parse_client_secrets(&contents)
    }
}

#[async_trait]
impl OAuthClient for GoogleOAuthClient {
    async fn refresh(&self, record: &CredentialRecord) -> AuthResult<CredentialRecord> {
        let refresh_token = record
            .refresh_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::RefreshFailed("no refresh token".to_string()))?;

        let client = build_client(
            &record.client_id,
            record.client_secret.as_deref(),
            GOOGLE_AUTH_URI,
            &record.token_uri,
        )?;

        let token = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::RefreshFailed(describe_token_error(e)))?;

        let mut refreshed = record.clone();
        refreshed.token = token.access_token().secret().clone();
        if let Some(rotated) = token.refresh_token() {
            refreshed.refresh_token = Some(rotated.secret().clone());
        }
        if let Some(scopes) = scopes_of(&token) {
            refreshed.scopes = scopes;
        }
        refreshed.expiry = expiry_of(&token);

        tracing::info!("Refreshed Google access token");
        Ok(refreshed)
    }

    async fn consent(&self, scopes: &[String]) -> AuthResult<CredentialRecord> {
        let config = self.load_secrets()?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let redirect_url = RedirectUrl::new(format!("http://127.0.0.1:{}/", port))
            .map_err(|e| AuthError::InvalidSecrets(format!("redirect uri: {}", e)))?;

        let client = build_client(
            &config.client_id,
            config.client_secret.as_deref(),
            &config.auth_uri,
            &config.token_uri,
        )?
        .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        println!("Please visit this URL to authorize this application: {}", auth_url);
        if let Err(e) = open::that(auth_url.as_str()) {
            tracing::warn!(error = %e, "Failed to open browser");
        }

        let code = wait_for_code(&listener, &csrf_state).await?;

        let token = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::ExchangeFailed(describe_token_error(e)))?;

        tracing::info!("Google consent completed");

        Ok(CredentialRecord {
            token: token.access_token().secret().clone(),
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
            token_uri: config.token_uri,
            client_id: config.client_id,
            client_secret: config.client_secret,
            scopes: scopes_of(&token).unwrap_or_else(|| scopes.to_vec()),
            expiry: expiry_of(&token),
        })
    }
}
