//! Auth service calls.
//!
//! Password sign-in and refresh both go through the token endpoint and
//! answer with a session (tokens plus the auth user).

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tutaviendo_core::{Email, Password, UserId};

use super::{Connection, SupabaseError, check};

const TOKEN_PATH: &str = "auth/v1/token";
const SIGNUP_PATH: &str = "auth/v1/signup";
const LOGOUT_PATH: &str = "auth/v1/logout";

/// Tokens of a signed-in backend session.
#[derive(Debug, Clone)]
pub struct SessionToken {
    /// JWT access token for API requests.
    pub access_token: SecretString,
    /// Refresh token for obtaining new access tokens.
    pub refresh_token: SecretString,
    /// Unix timestamp when the access token expires.
    pub expires_at: i64,
}

impl SessionToken {
    /// A session known only by its refresh token, e.g. loaded from disk.
    ///
    /// The access token is treated as expired, so the first use refreshes.
    #[must_use]
    pub fn from_refresh_token(refresh_token: SecretString) -> Self {
        Self {
            access_token: SecretString::from(String::new()),
            refresh_token,
            expires_at: 0,
        }
    }

    /// Check if the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        // Consider expired if less than 60 seconds remaining
        now >= self.expires_at - 60
    }
}

/// The user record of the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Free-form metadata stored with the auth user at sign-up.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A fresh session as returned by the token and signup endpoints.
#[derive(Debug)]
pub struct AuthSession {
    pub token: SessionToken,
    pub user: AuthUser,
}

/// Outcome of a sign-up.
#[derive(Debug)]
pub enum SignUpOutcome {
    /// The account is active and signed in.
    SignedIn(AuthSession),
    /// The account exists but waits for email confirmation.
    ConfirmationPending(AuthUser),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    /// Token lifetime in seconds.
    expires_in: i64,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> AuthSession {
        let now = chrono::Utc::now().timestamp();
        AuthSession {
            token: SessionToken {
                access_token: SecretString::from(self.access_token),
                refresh_token: SecretString::from(self.refresh_token),
                expires_at: now + self.expires_in,
            },
            user: self.user,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

#[derive(Serialize)]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData<'a>,
}

#[derive(Serialize)]
struct SignUpData<'a> {
    name: &'a str,
}

/// Sign in with email and password.
///
/// # Errors
///
/// Returns `SupabaseError::Api` carrying the backend message (e.g.
/// "Invalid login credentials") if the credentials are rejected.
#[instrument(skip(conn, password), fields(email = %email))]
pub(crate) async fn sign_in_with_password(
    conn: &Connection,
    email: &Email,
    password: &Password,
) -> Result<AuthSession, SupabaseError> {
    let url = conn.endpoint(TOKEN_PATH, &[("grant_type", "password")])?;
    let response = conn
        .request(Method::POST, url)
        .json(&PasswordRequest {
            email: email.as_str(),
            password: password.expose(),
        })
        .send()
        .await?;

    let token: TokenResponse = check(response).await?.json().await?;
    Ok(token.into_session())
}

/// Exchange a refresh token for a new session.
///
/// # Errors
///
/// Returns `SupabaseError::Api` if the refresh token is invalid, expired or
/// already used.
#[instrument(skip_all)]
pub(crate) async fn refresh_session(
    conn: &Connection,
    refresh_token: &SecretString,
) -> Result<AuthSession, SupabaseError> {
    let url = conn.endpoint(TOKEN_PATH, &[("grant_type", "refresh_token")])?;
    let response = conn
        .request(Method::POST, url)
        .json(&serde_json::json!({
            "refresh_token": refresh_token.expose_secret()
        }))
        .send()
        .await?;

    let token: TokenResponse = check(response).await?.json().await?;
    Ok(token.into_session())
}

/// Create an account. The display name is stored as user metadata.
///
/// # Errors
///
/// Returns `SupabaseError::Api` with "User already registered" if the email
/// is taken.
#[instrument(skip(conn, password), fields(email = %email))]
pub(crate) async fn sign_up(
    conn: &Connection,
    email: &Email,
    password: &Password,
    name: &str,
) -> Result<SignUpOutcome, SupabaseError> {
    let url = conn.endpoint(SIGNUP_PATH, &[])?;
    let response = conn
        .request(Method::POST, url)
        .json(&SignUpRequest {
            email: email.as_str(),
            password: password.expose(),
            data: SignUpData { name },
        })
        .send()
        .await?;

    let outcome = match check(response).await?.json::<SignUpResponse>().await? {
        SignUpResponse::Session(token) => SignUpOutcome::SignedIn(token.into_session()),
        SignUpResponse::User(user) => SignUpOutcome::ConfirmationPending(user),
    };
    Ok(outcome)
}

/// Revoke the session holding `access_token`.
///
/// # Errors
///
/// Returns `SupabaseError` if the request fails or the backend rejects it.
#[instrument(skip_all)]
pub(crate) async fn sign_out(
    conn: &Connection,
    access_token: &SecretString,
) -> Result<(), SupabaseError> {
    let url = conn.endpoint(LOGOUT_PATH, &[])?;
    let response = conn
        .authed(Method::POST, url, access_token)
        .send()
        .await?;
    check(response).await?;
    Ok(())
}
