//! Credential types.
//!
//! Type-safe wrapper for the password typed into the sign-in form.

use core::fmt;

/// Errors that can occur when validating a [`Password`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The input string is empty.
    #[error("password cannot be empty")]
    Empty,
    /// The input is shorter than the backend accepts.
    #[error("password must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
}

/// A password that passed client-side validation.
///
/// The value is never printed: `Debug` is redacted and there is no
/// `Display` implementation.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Minimum number of characters accepted by the hosted auth service.
    pub const MIN_LENGTH: usize = 6;

    /// Validate a password.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Empty` for an empty input and
    /// `PasswordError::TooShort` for fewer than [`Self::MIN_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, PasswordError> {
        if s.is_empty() {
            return Err(PasswordError::Empty);
        }

        if s.chars().count() < Self::MIN_LENGTH {
            return Err(PasswordError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the raw password for handing to the auth backend.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}
