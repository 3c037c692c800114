//! Authentication backend contract.
//!
//! The hosted service owns accounts and sessions. The session context only
//! needs the four operations below; implementations are
//! [`crate::supabase::SupabaseClient`] and [`crate::memory::MemoryBackend`].

mod error;

pub use error::{AuthError, AuthErrorKind};
pub(crate) use error::{ALREADY_REGISTERED, EMAIL_NOT_CONFIRMED, INVALID_CREDENTIALS};

use async_trait::async_trait;

use tutaviendo_core::{Email, Password};

use crate::models::User;

/// Hosted authentication operations.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] classified from the backend message.
    async fn sign_in(&self, email: &Email, password: &Password) -> Result<User, AuthError>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthErrorKind::AlreadyRegistered`] if the email is taken.
    async fn sign_up(
        &self,
        email: &Email,
        password: &Password,
        name: &str,
    ) -> Result<User, AuthError>;

    /// End the backend session.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if the backend could not be reached or
    /// refused the request. Local state is cleared by the caller regardless.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Restore a previously persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if a persisted session exists but could not
    /// be exchanged for a user.
    async fn restore_session(&self) -> Result<Option<User>, AuthError>;
}
