//! Hosted backend (Supabase) HTTP client.
//!
//! Talks to the two services of a hosted project:
//!
//! - Auth (`/auth/v1/*`): password sign-in, sign-up, refresh, logout
//! - REST (`/rest/v1/*`): `profiles` and `stores` tables
//!
//! # Authentication
//!
//! Every request carries the project's anon key as `apikey`. Requests made
//! on behalf of the signed-in user add the user's access token as a bearer
//! token. Tokens are cached in memory and refreshed when expired; the CLI
//! persists only the refresh token between runs.

pub mod auth;
pub mod client;
pub mod rest;

pub use client::SupabaseClient;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;
use crate::services::{AuthError, AuthErrorKind, PersistenceError};

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The backend answered with something unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No signed-in session to authorize the request.
    #[error("No active session")]
    NoSession,
}

impl From<SupabaseError> for AuthError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Api { message, .. } => Self::from_backend_message(message),
            other => Self::new(AuthErrorKind::Unknown, other.to_string()),
        }
    }
}

impl From<SupabaseError> for PersistenceError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::NoSession | SupabaseError::Api { status: 401, .. } => Self::NotSignedIn,
            SupabaseError::Api { message, .. } => Self::Rejected(message),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Error body shapes used by the auth and REST services.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

/// HTTP plumbing shared by the auth and REST calls.
pub(crate) struct Connection {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
}

impl Connection {
    /// Build the HTTP client for `config`.
    pub(crate) fn new(config: &BackendConfig) -> Result<Self, SupabaseError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tutaviendo-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.clone(),
            anon_key: config.anon_key.clone(),
        })
    }

    /// Absolute URL of `path` (relative to the project root) with `query`.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, SupabaseError> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// A request carrying the project key.
    pub(crate) fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.anon_key.expose_secret())
    }

    /// A request on behalf of the user holding `access_token`.
    pub(crate) fn authed(
        &self,
        method: Method,
        url: Url,
        access_token: &SecretString,
    ) -> reqwest::RequestBuilder {
        self.request(method, url)
            .bearer_auth(access_token.expose_secret())
    }
}

/// Pass successful responses through; turn error statuses into
/// [`SupabaseError::Api`] with the message from the body.
pub(crate) async fn check(response: reqwest::Response) -> Result<reqwest::Response, SupabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body
            }
        });

    tracing::debug!(status = status.as_u16(), message, "Backend request rejected");
    Err(SupabaseError::Api {
        status: status.as_u16(),
        message,
    })
}
