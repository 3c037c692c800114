//! Hosted backend client implementing the auth and store contracts.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::instrument;

use tutaviendo_core::{Email, Password, StoreId, UserId};

use super::auth::{self, AuthSession, AuthUser, SessionToken, SignUpOutcome};
use super::rest::{self, ProfileRow};
use super::{Connection, SupabaseError};
use crate::config::BackendConfig;
use crate::models::{Store, StoreUpdate, User};
use crate::services::{AuthBackend, AuthError, AuthErrorKind, PersistenceError, StoreBackend};

/// Hosted backend client.
///
/// Cheap to clone; clones share the HTTP connection pool and the token
/// cache.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    conn: Connection,
    /// In-memory token cache
    token: RwLock<Option<SessionToken>>,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.inner.conn.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Create a client without a session.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Http` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, SupabaseError> {
        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                conn: Connection::new(config)?,
                token: RwLock::new(None),
            }),
        })
    }

    // =========================================================================
    // Token cache
    // =========================================================================

    /// Seed the cache with a refresh token persisted by an earlier run.
    ///
    /// The next [`AuthBackend::restore_session`] exchanges it for a session.
    pub async fn set_refresh_token(&self, refresh_token: SecretString) {
        *self.inner.token.write().await = Some(SessionToken::from_refresh_token(refresh_token));
    }

    /// The refresh token of the current session, for persisting.
    pub async fn refresh_token(&self) -> Option<SecretString> {
        self.inner
            .token
            .read()
            .await
            .as_ref()
            .map(|token| token.refresh_token.clone())
    }

    /// Check if a session is cached.
    pub async fn has_session(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// A valid access token, refreshing the session if it has expired.
    async fn access_token(&self) -> Result<SecretString, SupabaseError> {
        let token = self
            .inner
            .token
            .read()
            .await
            .clone()
            .ok_or(SupabaseError::NoSession)?;

        if !token.is_expired() {
            return Ok(token.access_token);
        }

        tracing::debug!("Access token expired, refreshing");
        let session = auth::refresh_session(&self.inner.conn, &token.refresh_token).await?;
        let access_token = session.token.access_token.clone();
        *self.inner.token.write().await = Some(session.token);
        Ok(access_token)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Cache the session tokens and build the user record.
    async fn start_session(
        &self,
        session: AuthSession,
        fallback_email: Option<&Email>,
    ) -> Result<User, SupabaseError> {
        let access_token = session.token.access_token.clone();
        *self.inner.token.write().await = Some(session.token);

        // The user is signed in even if the profile row cannot be read.
        let profile = match rest::fetch_profile(&self.inner.conn, &access_token, session.user.id).await {
            Ok(profile) => profile.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, user_id = %session.user.id, "Failed to load profile");
                ProfileRow::default()
            }
        };

        build_user(session.user, profile, fallback_email)
    }
}

/// Merge the auth user and its profile row.
///
/// The profile wins over sign-up metadata; the email local part is the last
/// resort for the display name.
fn build_user(
    auth_user: AuthUser,
    profile: ProfileRow,
    fallback_email: Option<&Email>,
) -> Result<User, SupabaseError> {
    let email = match auth_user.email.as_deref().map(Email::parse) {
        Some(Ok(email)) => email,
        _ => fallback_email.cloned().ok_or_else(|| {
            SupabaseError::InvalidResponse(format!("user {} has no valid email", auth_user.id))
        })?,
    };

    let name = profile
        .name
        .or(auth_user.user_metadata.name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| email.local_part().to_string());

    Ok(User {
        id: auth_user.id,
        email,
        name,
        avatar: profile.avatar_url.or(auth_user.user_metadata.avatar_url),
        plan_id: profile.plan_id,
    })
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: &Email, password: &Password) -> Result<User, AuthError> {
        let session = auth::sign_in_with_password(&self.inner.conn, email, password).await?;
        Ok(self.start_session(session, Some(email)).await?)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &Password,
        name: &str,
    ) -> Result<User, AuthError> {
        match auth::sign_up(&self.inner.conn, email, password, name).await? {
            SignUpOutcome::SignedIn(session) => Ok(self.start_session(session, Some(email)).await?),
            SignUpOutcome::ConfirmationPending(user) => {
                tracing::info!(user_id = %user.id, "Account created, confirmation pending");
                Err(AuthError::new(
                    AuthErrorKind::EmailNotConfirmed,
                    "Email not confirmed",
                ))
            }
        }
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(token) = self.inner.token.write().await.take() else {
            return Ok(());
        };
        let access_token = if token.is_expired() {
            // The refresh token stays valid server-side until revoked
            match auth::refresh_session(&self.inner.conn, &token.refresh_token).await {
                Ok(session) => session.token.access_token,
                Err(SupabaseError::Api { status, message }) if status < 500 => {
                    tracing::debug!(status, %message, "Refresh token already invalid");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
        } else {
            token.access_token
        };
        auth::sign_out(&self.inner.conn, &access_token).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn restore_session(&self) -> Result<Option<User>, AuthError> {
        let Some(token) = self.inner.token.read().await.clone() else {
            return Ok(None);
        };

        match auth::refresh_session(&self.inner.conn, &token.refresh_token).await {
            Ok(session) => Ok(Some(self.start_session(session, None).await?)),
            Err(err) => {
                *self.inner.token.write().await = None;
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl StoreBackend for SupabaseClient {
    async fn list_stores(&self, owner: UserId) -> Result<Vec<Store>, PersistenceError> {
        let access_token = self.access_token().await?;
        Ok(rest::list_stores(&self.inner.conn, &access_token, owner).await?)
    }

    async fn update_store(
        &self,
        store_id: StoreId,
        update: &StoreUpdate,
    ) -> Result<Store, PersistenceError> {
        let access_token = self.access_token().await?;
        rest::update_store(&self.inner.conn, &access_token, store_id, update)
            .await?
            .ok_or(PersistenceError::StoreNotFound(store_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const USER_ID: &str = "6f1c1c5e-8a47-4d8e-9b8a-2f9b4a7c3d10";
    const STORE_ID: &str = "0b6c2f0e-7a1d-4a53-8f65-2a4c8e9d1b20";

    fn client(server: &MockServer) -> SupabaseClient {
        let config = BackendConfig::new(
            &server.uri(),
            SecretString::from("test-anon-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        SupabaseClient::new(&config).unwrap()
    }

    fn session_body(access_token: &str) -> serde_json::Value {
        json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-1",
            "user": {
                "id": USER_ID,
                "email": "ana@tienda.com",
                "user_metadata": { "name": "Ana" }
            }
        })
    }

    fn store_row(accept_cash: bool) -> serde_json::Value {
        json!({
            "id": STORE_ID,
            "owner_id": USER_ID,
            "name": "Dulces Ana",
            "accept_cash": accept_cash,
            "accept_bank_transfer": false,
            "bank_details": null,
            "allow_pickup": true,
            "allow_delivery": false,
            "delivery_cost": 0,
            "delivery_zone": null,
            "currency": "USD",
            "products": []
        })
    }

    async fn mount_profile(server: &MockServer, rows: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .mount(server)
            .await;
    }

    fn email() -> Email {
        Email::parse("ana@tienda.com").unwrap()
    }

    fn password() -> Password {
        Password::parse("secreto1").unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_merges_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "test-anon-key"))
            .and(body_partial_json(json!({ "email": "ana@tienda.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("access-1")))
            .expect(1)
            .mount(&server)
            .await;
        mount_profile(
            &server,
            json!([{ "name": "Ana María", "avatar_url": null, "plan_id": "pro" }]),
        )
        .await;

        let client = client(&server);
        let user = client.sign_in(&email(), &password()).await.unwrap();

        assert_eq!(user.id.to_string(), USER_ID);
        assert_eq!(user.name, "Ana María");
        assert_eq!(user.plan().name, "Pro");
        assert!(client.has_session().await);
    }

    #[tokio::test]
    async fn test_sign_in_falls_back_to_metadata_without_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("access-1")))
            .mount(&server)
            .await;
        mount_profile(&server, json!([])).await;

        let user = client(&server).sign_in(&email(), &password()).await.unwrap();

        assert_eq!(user.name, "Ana");
        assert!(user.plan().is_free);
    }

    #[tokio::test]
    async fn test_sign_in_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 400,
                "error_code": "invalid_credentials",
                "msg": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let err = client.sign_in(&email(), &password()).await.unwrap_err();

        assert_eq!(err.kind(), AuthErrorKind::InvalidCredentials);
        assert!(!client.has_session().await);
    }

    #[tokio::test]
    async fn test_sign_up_pending_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_partial_json(json!({ "data": { "name": "Ana" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": USER_ID,
                "email": "ana@tienda.com",
                "user_metadata": { "name": "Ana" }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .sign_up(&email(), &password(), "Ana")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), AuthErrorKind::EmailNotConfirmed);
    }

    #[tokio::test]
    async fn test_sign_up_taken_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": 422,
                "error_code": "user_already_exists",
                "msg": "User already registered"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .sign_up(&email(), &password(), "Ana")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), AuthErrorKind::AlreadyRegistered);
    }

    #[tokio::test]
    async fn test_restore_session_from_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_partial_json(json!({ "refresh_token": "persisted" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("access-2")))
            .expect(1)
            .mount(&server)
            .await;
        mount_profile(&server, json!([])).await;

        let client = client(&server);
        assert!(client.restore_session().await.unwrap().is_none());

        client
            .set_refresh_token(SecretString::from("persisted".to_string()))
            .await;
        let user = client.restore_session().await.unwrap();

        assert_eq!(user.map(|u| u.name), Some("Ana".to_string()));
    }

    #[tokio::test]
    async fn test_restore_session_failure_clears_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "msg": "Invalid Refresh Token: Already Used"
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        client.set_refresh_token(SecretString::from("stale".to_string())).await;

        assert!(client.restore_session().await.is_err());
        assert!(!client.has_session().await);
    }

    #[tokio::test]
    async fn test_sign_out_revokes_and_clears() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("access-1")))
            .mount(&server)
            .await;
        mount_profile(&server, json!([])).await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        client.sign_in(&email(), &password()).await.unwrap();
        client.sign_out().await.unwrap();

        assert!(!client.has_session().await);
        assert!(client.sign_out().await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_out_with_expired_token_refreshes_then_revokes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_partial_json(json!({ "refresh_token": "persisted" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("access-3")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer access-3"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        client
            .set_refresh_token(SecretString::from("persisted".to_string()))
            .await;
        client.sign_out().await.unwrap();

        assert!(!client.has_session().await);
    }

    #[tokio::test]
    async fn test_sign_out_with_revoked_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "msg": "Invalid Refresh Token: Revoked"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server);
        client
            .set_refresh_token(SecretString::from("revoked".to_string()))
            .await;

        assert!(client.sign_out().await.is_ok());
        assert!(!client.has_session().await);
    }

    #[tokio::test]
    async fn test_store_calls_require_session() {
        let server = MockServer::start().await;
        let err = client(&server)
            .list_stores(UserId::random())
            .await
            .unwrap_err();
        assert_eq!(err, PersistenceError::NotSignedIn);
    }

    #[tokio::test]
    async fn test_list_and_update_stores() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("access-1")))
            .mount(&server)
            .await;
        mount_profile(&server, json!([])).await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/stores"))
            .and(query_param("owner_id", format!("eq.{USER_ID}")))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([store_row(false)])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/stores"))
            .and(query_param("id", format!("eq.{STORE_ID}")))
            .and(header("prefer", "return=representation"))
            .and(body_partial_json(json!({ "accept_cash": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([store_row(true)])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let user = client.sign_in(&email(), &password()).await.unwrap();

        let stores = client.list_stores(user.id).await.unwrap();
        assert_eq!(stores.len(), 1);
        assert!(!stores[0].accept_cash);

        let update = StoreUpdate {
            accept_cash: Some(true),
            ..StoreUpdate::default()
        };
        let saved = client.update_store(stores[0].id, &update).await.unwrap();
        assert!(saved.accept_cash);
    }

    #[tokio::test]
    async fn test_update_invisible_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("access-1")))
            .mount(&server)
            .await;
        mount_profile(&server, json!([])).await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/stores"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client(&server);
        client.sign_in(&email(), &password()).await.unwrap();

        let store_id = StoreId::random();
        let err = client
            .update_store(store_id, &StoreUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err, PersistenceError::StoreNotFound(store_id));
    }

    #[test]
    fn test_build_user_name_fallbacks() {
        let auth_user: AuthUser = serde_json::from_value(json!({
            "id": USER_ID,
            "email": "ana@tienda.com"
        }))
        .unwrap();

        let user = build_user(auth_user, ProfileRow::default(), None).unwrap();
        assert_eq!(user.name, "ana");
        assert_eq!(user.plan_id, None);
    }

    #[test]
    fn test_build_user_without_email() {
        let auth_user: AuthUser = serde_json::from_value(json!({ "id": USER_ID })).unwrap();

        assert!(build_user(auth_user.clone(), ProfileRow::default(), None).is_err());
        let user = build_user(auth_user, ProfileRow::default(), Some(&email())).unwrap();
        assert_eq!(user.email, email());
    }
}
