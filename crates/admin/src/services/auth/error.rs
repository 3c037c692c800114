//! Authentication error types.

use thiserror::Error;

/// Backend messages recognised when classifying an [`AuthError`].
pub(crate) const INVALID_CREDENTIALS: &str = "Invalid login credentials";
pub(crate) const EMAIL_NOT_CONFIRMED: &str = "Email not confirmed";
pub(crate) const ALREADY_REGISTERED: &str = "User already registered";

/// Classification of a backend authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// Email/password pair rejected.
    InvalidCredentials,
    /// Account exists but the confirmation link was not followed yet.
    EmailNotConfirmed,
    /// Registration with an email that already has an account.
    AlreadyRegistered,
    /// Anything else, including transport failures.
    Unknown,
}

/// A backend-rejected sign-in, registration or sign-out.
///
/// Carries the raw backend message; callers map it to user-facing text via
/// [`crate::messages::auth_error_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthError {
    kind: AuthErrorKind,
    message: String,
}

impl AuthError {
    /// Create an error with an explicit kind.
    #[must_use]
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a raw backend message by its known substrings.
    #[must_use]
    pub fn from_backend_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = if message.contains(INVALID_CREDENTIALS) {
            AuthErrorKind::InvalidCredentials
        } else if message.contains(EMAIL_NOT_CONFIRMED) {
            AuthErrorKind::EmailNotConfirmed
        } else if message.contains(ALREADY_REGISTERED) {
            AuthErrorKind::AlreadyRegistered
        } else {
            AuthErrorKind::Unknown
        };
        Self { kind, message }
    }

    /// The failure classification.
    #[must_use]
    pub const fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    /// The raw backend message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
