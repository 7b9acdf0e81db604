//! Refresh-or-consent authorization.
//!
//! [`authorize`] decides what the cached token is still good for; the
//! [`ConsentFlow`] does the network side (refreshing, or running the browser
//! consent flow against a localhost redirect).

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use super::token_store::TokenStore;
use super::{load_credentials, GoogleApiError, GoogleToken};

pub trait ConsentFlow {
    /// Obtain a brand new grant for `scopes` from the user.
    fn run_consent(&self, scopes: &[&str]) -> Result<GoogleToken, GoogleApiError>;
    /// Exchange the refresh token for a new access token.
    fn refresh(&self, token: &GoogleToken) -> Result<GoogleToken, GoogleApiError>;
}

/// Produce a usable token for `scopes`, persisting anything newly obtained.
///
/// A cached token whose grant is narrower than `scopes` is discarded. An
/// expired token is refreshed when possible; a failed refresh falls back to
/// consent.
pub fn authorize(
    store: &dyn TokenStore,
    flow: &dyn ConsentFlow,
    scopes: &[&str],
    now: DateTime<Utc>,
) -> Result<GoogleToken, GoogleApiError> {
    let cached = match store.load() {
        Ok(token) => token,
        Err(GoogleApiError::Json(err)) => {
            warn!(error = %err, "cached token is unreadable; discarding it");
            None
        }
        Err(err) => return Err(err),
    };

    let cached = match cached {
        Some(token) if !token.covers_scopes(scopes) => {
            info!("cached token does not cover the required scopes; requesting fresh consent");
            None
        }
        other => other,
    };

    if let Some(token) = cached {
        if !token.is_expired(now) {
            return Ok(token);
        }

        if token.refresh_token.is_some() {
            match flow.refresh(&token) {
                Ok(refreshed) => {
                    store.save(&refreshed)?;
                    info!("refreshed cached access token");
                    return Ok(refreshed);
                }
                Err(err) => warn!(error = %err, "token refresh failed; requesting fresh consent"),
            }
        }
    }

    let fresh = flow.run_consent(scopes)?;
    store.save(&fresh)?;
    info!("stored newly granted credentials");
    Ok(fresh)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    fn expiry(&self) -> String {
        let lifetime = self.expires_in.unwrap_or(3600);
        (Utc::now() + chrono::Duration::seconds(lifetime)).to_rfc3339()
    }

    fn granted_scopes(&self) -> Option<Vec<String>> {
        self.scope
            .as_deref()
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
    }
}

/// Installed-app consent: opens the browser and captures the redirect on a
/// random localhost port. The client credentials file is only read when a
/// consent is actually needed; refreshes use what the cached token carries.
pub struct BrowserConsentFlow {
    credentials_path: PathBuf,
    http: reqwest::Client,
    runtime: Arc<Runtime>,
}

impl BrowserConsentFlow {
    pub fn new(credentials_path: impl Into<PathBuf>, runtime: Arc<Runtime>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            http: reqwest::Client::new(),
            runtime,
        }
    }

    fn exchange(&self, form: &[(&str, &str)], token_uri: &str) -> Result<TokenResponse, GoogleApiError> {
        self.runtime.block_on(async {
            let response = self.http.post(token_uri).form(form).send().await?;
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err(map_token_error(status.as_u16(), &body));
            }
            Ok(serde_json::from_str::<TokenResponse>(&body)?)
        })
    }
}

impl std::fmt::Debug for BrowserConsentFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserConsentFlow")
            .field("credentials_path", &self.credentials_path)
            .finish_non_exhaustive()
    }
}

impl ConsentFlow for BrowserConsentFlow {
    fn run_consent(&self, scopes: &[&str]) -> Result<GoogleToken, GoogleApiError> {
        let credentials = load_credentials(&self.credentials_path)?;
        let installed = &credentials.installed;

        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://localhost:{port}");

        let scope_string = scopes.join(" ");
        let auth_url = url::Url::parse_with_params(
            &installed.auth_uri,
            &[
                ("client_id", installed.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope_string.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )?;

        info!("opening browser for Google consent");
        if let Err(err) = open::that(auth_url.as_str()) {
            warn!(error = %err, url = %auth_url, "failed to open browser; visit the URL manually");
        }

        let code = wait_for_auth_code(&listener)?;

        let mut form = vec![
            ("code", code.as_str()),
            ("client_id", installed.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        if let Some(secret) = installed.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = self.exchange(&form, &installed.token_uri)?;
        let expiry = response.expiry();
        let scopes = response
            .granted_scopes()
            .unwrap_or_else(|| scopes.iter().map(|scope| scope.to_string()).collect());

        Ok(GoogleToken {
            token: response.access_token,
            refresh_token: response.refresh_token,
            token_uri: installed.token_uri.clone(),
            client_id: installed.client_id.clone(),
            client_secret: installed.client_secret.clone(),
            scopes,
            expiry: Some(expiry),
        })
    }

    fn refresh(&self, token: &GoogleToken) -> Result<GoogleToken, GoogleApiError> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or(GoogleApiError::AuthExpired)?;

        let mut form = vec![
            ("client_id", token.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = token.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = self.exchange(&form, &token.token_uri)?;

        let mut refreshed = token.clone();
        refreshed.expiry = Some(response.expiry());
        if let Some(scopes) = response.granted_scopes() {
            refreshed.scopes = scopes;
        }
        if let Some(rotated) = response.refresh_token {
            refreshed.refresh_token = Some(rotated);
        }
        refreshed.token = response.access_token;
        Ok(refreshed)
    }
}

fn map_token_error(status: u16, body: &str) -> GoogleApiError {
    let lowered = body.to_lowercase();
    if (status == 400 || status == 401)
        && (lowered.contains("invalid_grant") || lowered.contains("token has been expired"))
    {
        return GoogleApiError::AuthExpired;
    }
    GoogleApiError::RefreshFailed(format!("HTTP {status}: {body}"))
}

/// Block until the browser redirect arrives and pull the `code` out of it.
fn wait_for_auth_code(listener: &TcpListener) -> Result<String, GoogleApiError> {
    let (mut stream, _) = listener.accept()?;

    let mut buffer = [0u8; 4096];
    let n = stream.read(&mut buffer)?;
    let request = String::from_utf8_lossy(&buffer[..n]);

    match extract_auth_code(&request) {
        Some(code) => {
            send_response(
                &mut stream,
                "Authorization successful! You can close this tab.",
            );
            Ok(code)
        }
        None => {
            send_response(&mut stream, "Authorization was not granted. You can close this tab.");
            Err(GoogleApiError::FlowCancelled)
        }
    }
}

/// Parse `GET /?code=...&scope=... HTTP/1.1`, percent-decoding the code.
fn extract_auth_code(request: &str) -> Option<String> {
    let target = request.lines().next()?.split_whitespace().nth(1)?;
    let query = target.split_once('?')?.1;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
}

fn send_response(stream: &mut impl Write, message: &str) {
    let body = format!(
        "<html><body style=\"font-family: system-ui; text-align: center; padding: 40px;\">\
         <h2>{message}</h2></body></html>"
    );
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
