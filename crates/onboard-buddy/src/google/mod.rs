//! Google Sheets and Calendar access over plain REST.
//!
//! - auth: refresh-or-consent authorization against a cached token
//! - token_store: where the cached token lives
//! - sheets: roster reads
//! - calendar: orientation event creation

pub mod auth;
pub mod calendar;
pub mod sheets;
pub mod token_store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

pub use auth::{authorize, BrowserConsentFlow, ConsentFlow};
pub use calendar::{CalendarGateway, CreatedEvent, EventAttendee, EventRequest, EventTime, GoogleCalendarClient};
pub use sheets::GoogleSheetsClient;
pub use token_store::{FileTokenStore, InMemoryTokenStore, TokenStore};

/// Scopes the onboarding run needs: read the roster, write orientation events.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/calendar",
];

/// Cached OAuth2 credential material.
///
/// Field names follow the authorized-user JSON layout, so token files written
/// by other Google client libraries load as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleToken {
    #[serde(alias = "access_token")]
    pub token: String,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// RFC 3339 expiry instant.
    #[serde(default)]
    pub expiry: Option<String>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl GoogleToken {
    pub fn covers_scopes(&self, required: &[&str]) -> bool {
        required
            .iter()
            .all(|scope| self.scopes.iter().any(|granted| granted == scope))
    }

    /// Missing or unreadable expiry counts as expired; so does anything
    /// within a minute of running out.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let Some(raw) = self.expiry.as_deref() else {
            return true;
        };
        match DateTime::parse_from_rfc3339(raw) {
            Ok(expiry) => expiry <= now + chrono::Duration::seconds(60),
            Err(_) => true,
        }
    }
}

/// OAuth2 client credentials (Desktop App `credentials.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    pub installed: InstalledAppCredentials,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstalledAppCredentials {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

pub fn load_credentials(path: &Path) -> Result<ClientCredentials, GoogleApiError> {
    if !path.exists() {
        return Err(GoogleApiError::CredentialsNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|err| GoogleApiError::InvalidCredentials(format!("{}: {}", path.display(), err)))
}

#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Credentials not found at {0}")]
    CredentialsNotFound(PathBuf),
    #[error("Invalid credentials format: {0}")]
    InvalidCredentials(String),
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("Token expired or revoked")]
    AuthExpired,
    #[error("OAuth flow cancelled")]
    FlowCancelled,
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Authorized HTTP access shared by the Sheets and Calendar clients.
///
/// Calls are async under the hood and driven to completion on the owned
/// runtime, so callers stay synchronous.
#[derive(Clone)]
pub struct GoogleApiClient {
    http: reqwest::Client,
    runtime: Arc<Runtime>,
    access_token: String,
}

impl GoogleApiClient {
    pub fn new(runtime: Arc<Runtime>, token: &GoogleToken) -> Self {
        Self {
            http: reqwest::Client::new(),
            runtime,
            access_token: token.token.clone(),
        }
    }

    pub(crate) fn get_json<T>(&self, url: url::Url) -> Result<T, GoogleApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.runtime.block_on(async {
            let response = self
                .http
                .get(url)
                .bearer_auth(&self.access_token)
                .send()
                .await?;
            Self::decode(response).await
        })
    }

    pub(crate) fn post_json<B, T>(&self, url: url::Url, body: &B) -> Result<T, GoogleApiError>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        self.runtime.block_on(async {
            let response = self
                .http
                .post(url)
                .bearer_auth(&self.access_token)
                .json(body)
                .send()
                .await?;
            Self::decode(response).await
        })
    }

    async fn decode<T>(response: reqwest::Response) -> Result<T, GoogleApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GoogleApiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

impl std::fmt::Debug for GoogleApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleApiClient").finish_non_exhaustive()
    }
}
