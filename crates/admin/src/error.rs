//! Unified error handling for the admin panel.

use thiserror::Error;

use tutaviendo_core::{Email, StoreId, UserId};

use crate::config::ConfigError;
use crate::services::{AuthError, AuthErrorKind, PersistenceError};

/// Client-side form validation failure.
///
/// Never reaches the backend; the message is shown inline next to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("El email es requerido")]
    EmailRequired,
    #[error("El email no es válido")]
    EmailInvalid,
    #[error("La contraseña es requerida")]
    PasswordRequired,
    #[error("La contraseña debe tener al menos {min} caracteres")]
    PasswordTooShort { min: usize },
    #[error("El nombre es requerido")]
    NameRequired,
}

/// Errors signaled by the session context operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The bootstrap check has not completed yet.
    #[error("session is not initialized")]
    NotInitialized,

    /// Another sign-in or registration is still in flight.
    #[error("another sign-in is in progress")]
    Busy,

    /// A logout finished while the sign-in was in flight; the sign-in was
    /// discarded.
    #[error("signed out while signing in")]
    SignedOut,

    /// The operation needs a signed-in user.
    #[error("no authenticated user")]
    NotAuthenticated,

    /// The operation needs a current store.
    #[error("no store selected")]
    NoCurrentStore,

    /// The requested store is not owned by the signed-in user.
    #[error("unknown store: {0}")]
    UnknownStore(StoreId),

    /// The auth backend rejected the request.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The store backend failed to save or load.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A session operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Local input validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SessionError {
    /// Whether this failure points at a backend or client defect rather than
    /// user input. Only these are reported to Sentry.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        match self {
            Self::Persistence(PersistenceError::Transport(_)) => true,
            Self::Auth(err) => err.kind() == AuthErrorKind::Unknown,
            _ => false,
        }
    }
}

/// Report an unexpected failure to Sentry and the log.
pub fn report_unexpected(err: &SessionError, operation: &str) {
    if err.is_unexpected() {
        let event_id = sentry::capture_error(err);
        tracing::error!(
            error = %err,
            operation,
            sentry_event_id = %event_id,
            "Unexpected session failure"
        );
    } else {
        tracing::debug!(error = %err, operation, "Session operation rejected");
    }
}

/// Set the Sentry user context for the signed-in store owner.
pub fn set_sentry_user(user_id: UserId, email: &Email) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
