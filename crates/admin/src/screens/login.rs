//! Sign-in / registration form.
//!
//! Submitting happens in two steps so the form can stay on screen while
//! the request is in flight: [`LoginForm::begin_submit`] validates and
//! locks the form, [`LoginForm::finish_submit`] applies the outcome.
//! [`LoginForm::submit`] runs both around a [`StoreContext`] call.

use tutaviendo_core::{Email, Password, PasswordError};

use crate::error::{SessionError, ValidationError};
use crate::messages;
use crate::services::{Location, NavigateOptions, Navigator, Route};
use crate::state::StoreContext;

/// Query parameter that opens the form in registration mode.
pub const REGISTER_QUERY_KEY: &str = "register";

/// Which form is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// Editable form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Password,
    Name,
}

/// Per-field validation errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub email: Option<ValidationError>,
    pub password: Option<ValidationError>,
    pub name: Option<ValidationError>,
}

impl FieldErrors {
    /// Whether no field has an error.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.name.is_none()
    }

    /// The error of one field.
    #[must_use]
    pub const fn get(&self, field: Field) -> Option<ValidationError> {
        match field {
            Field::Email => self.email,
            Field::Password => self.password,
            Field::Name => self.name,
        }
    }

    fn clear(&mut self, field: Field) {
        match field {
            Field::Email => self.email = None,
            Field::Password => self.password = None,
            Field::Name => self.name = None,
        }
    }
}

/// A validated request, ready to send.
#[derive(Debug, Clone)]
pub enum SubmitRequest {
    Login {
        email: Email,
        password: Password,
    },
    Register {
        email: Email,
        password: Password,
        name: String,
    },
}

impl SubmitRequest {
    /// Run the request against the session context.
    ///
    /// # Errors
    ///
    /// Returns the `SessionError` of the login or register call.
    pub async fn send(&self, context: &StoreContext) -> Result<(), SessionError> {
        match self {
            Self::Login { email, password } => context.login(email, password).await,
            Self::Register {
                email,
                password,
                name,
            } => context.register(email, password, name).await,
        }
    }
}

/// Result of a submit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Signed in; navigation to the dashboard was requested.
    SignedIn,
    /// Local validation failed; nothing was sent.
    Invalid,
    /// The backend refused; see [`LoginForm::general_error`].
    Rejected,
    /// A submit is already in flight.
    Busy,
}

/// State of the sign-in / registration form.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    mode: AuthMode,
    email: String,
    password: String,
    name: String,
    show_password: bool,
    errors: FieldErrors,
    general_error: Option<&'static str>,
    is_submitting: bool,
}

impl LoginForm {
    /// An empty form in `mode`.
    #[must_use]
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// An empty form, in registration mode if `register=true` is set.
    #[must_use]
    pub fn from_location(location: &Location) -> Self {
        let mode = if location.query_param(REGISTER_QUERY_KEY) == Some("true") {
            AuthMode::Register
        } else {
            AuthMode::Login
        };
        Self::new(mode)
    }

    #[must_use]
    pub const fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Current value of a field.
    #[must_use]
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::Name => &self.name,
        }
    }

    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Message shown above the form after a rejected submit.
    #[must_use]
    pub const fn general_error(&self) -> Option<&'static str> {
        self.general_error
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    #[must_use]
    pub const fn is_password_visible(&self) -> bool {
        self.show_password
    }

    /// Set a field. Its error, if any, goes away.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Email => self.email = value,
            Field::Password => self.password = value,
            Field::Name => self.name = value,
        }
        self.errors.clear(field);
    }

    pub fn toggle_password_visibility(&mut self) {
        if !self.is_submitting {
            self.show_password = !self.show_password;
        }
    }

    /// Switch between sign-in and registration.
    ///
    /// Clears every field and error and mirrors the mode in the `register`
    /// query parameter without navigating.
    pub fn toggle_mode(&mut self, navigator: &dyn Navigator) {
        if self.is_submitting {
            return;
        }

        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.email.clear();
        self.password.clear();
        self.name.clear();
        self.errors = FieldErrors::default();
        self.general_error = None;

        match self.mode {
            AuthMode::Register => navigator.replace_query(REGISTER_QUERY_KEY, Some("true")),
            AuthMode::Login => navigator.replace_query(REGISTER_QUERY_KEY, None),
        }
    }

    /// Validate the fields, recording an error per invalid field.
    ///
    /// Returns the request to send if every field is valid.
    pub fn validate(&mut self) -> Option<SubmitRequest> {
        let email = validate_email(&self.email);
        let password = validate_password(&self.password);
        let name = self.name.trim().to_string();

        self.errors = FieldErrors {
            email: email.as_ref().err().copied(),
            password: password.as_ref().err().copied(),
            name: (self.mode == AuthMode::Register && name.is_empty())
                .then_some(ValidationError::NameRequired),
        };

        let (Ok(email), Ok(password)) = (email, password) else {
            return None;
        };
        match self.mode {
            AuthMode::Login => Some(SubmitRequest::Login { email, password }),
            AuthMode::Register if self.errors.name.is_none() => Some(SubmitRequest::Register {
                email,
                password,
                name,
            }),
            AuthMode::Register => None,
        }
    }

    /// Validate and lock the form for submitting.
    ///
    /// # Errors
    ///
    /// Returns `SubmitOutcome::Busy` while another submit is in flight and
    /// `SubmitOutcome::Invalid` if validation failed.
    pub fn begin_submit(&mut self) -> Result<SubmitRequest, SubmitOutcome> {
        if self.is_submitting {
            return Err(SubmitOutcome::Busy);
        }
        let request = self.validate().ok_or(SubmitOutcome::Invalid)?;
        self.general_error = None;
        self.is_submitting = true;
        Ok(request)
    }

    /// Apply the outcome of a submitted request and unlock the form.
    ///
    /// Success navigates to the dashboard, replacing the login entry.
    pub fn finish_submit(
        &mut self,
        result: Result<(), SessionError>,
        navigator: &dyn Navigator,
    ) -> SubmitOutcome {
        self.is_submitting = false;
        match result {
            Ok(()) => {
                navigator.navigate(Route::Admin.path(), NavigateOptions::replace());
                SubmitOutcome::SignedIn
            }
            Err(err) => {
                tracing::debug!(error = %err, "Authentication failed");
                self.general_error = Some(match &err {
                    SessionError::Auth(auth) => messages::auth_error_message(auth),
                    _ => messages::AUTH_GENERIC,
                });
                SubmitOutcome::Rejected
            }
        }
    }

    /// Validate, send and apply the outcome in one go.
    pub async fn submit(
        &mut self,
        context: &StoreContext,
        navigator: &dyn Navigator,
    ) -> SubmitOutcome {
        match self.begin_submit() {
            Ok(request) => {
                let result = request.send(context).await;
                self.finish_submit(result, navigator)
            }
            Err(outcome) => outcome,
        }
    }

    // =========================================================================
    // Labels
    // =========================================================================

    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self.mode {
            AuthMode::Login => messages::LOGIN_TITLE,
            AuthMode::Register => messages::REGISTER_TITLE,
        }
    }

    #[must_use]
    pub const fn subtitle(&self) -> &'static str {
        match self.mode {
            AuthMode::Login => messages::LOGIN_SUBTITLE,
            AuthMode::Register => messages::REGISTER_SUBTITLE,
        }
    }

    #[must_use]
    pub const fn submit_label(&self) -> &'static str {
        match (self.mode, self.is_submitting) {
            (AuthMode::Login, false) => messages::LOGIN_TITLE,
            (AuthMode::Login, true) => messages::LOGIN_SUBMITTING,
            (AuthMode::Register, false) => messages::REGISTER_TITLE,
            (AuthMode::Register, true) => messages::REGISTER_SUBMITTING,
        }
    }

    /// Prompt next to the mode switch.
    #[must_use]
    pub const fn toggle_prompt(&self) -> &'static str {
        match self.mode {
            AuthMode::Login => messages::NO_ACCOUNT,
            AuthMode::Register => messages::HAVE_ACCOUNT,
        }
    }

    /// Label of the mode switch (the other mode's title).
    #[must_use]
    pub const fn toggle_label(&self) -> &'static str {
        match self.mode {
            AuthMode::Login => messages::REGISTER_TITLE,
            AuthMode::Register => messages::LOGIN_TITLE,
        }
    }
}

fn validate_email(value: &str) -> Result<Email, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !looks_like_email(value) {
        return Err(ValidationError::EmailInvalid);
    }
    Email::parse(value).map_err(|_| ValidationError::EmailInvalid)
}

fn validate_password(value: &str) -> Result<Password, ValidationError> {
    Password::parse(value).map_err(|err| match err {
        PasswordError::Empty => ValidationError::PasswordRequired,
        PasswordError::TooShort { min } => ValidationError::PasswordTooShort { min },
    })
}

/// `something@something.something` somewhere in `value`, no whitespace
/// inside the match.
fn looks_like_email(value: &str) -> bool {
    value.split_whitespace().any(|token| {
        token.match_indices('@').any(|(at, _)| {
            at > 0
                && token.get(at + 1..).is_some_and(|domain| {
                    domain
                        .char_indices()
                        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
                })
        })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::MemoryBackend;
    use crate::services::{AuthError, MemoryNavigator};

    const PASSWORD: &str = "secreto1";

    async fn context_with_account() -> StoreContext {
        let backend = Arc::new(MemoryBackend::new());
        backend.add_account(&Email::parse("ana@tienda.com").unwrap(), PASSWORD, "Ana");
        let context = StoreContext::with_backend(backend);
        context.initialize().await;
        context
    }

    fn filled(mode: AuthMode, email: &str, password: &str) -> LoginForm {
        let mut form = LoginForm::new(mode);
        form.set(Field::Email, email);
        form.set(Field::Password, password);
        form
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("ana@tienda.com"));
        assert!(looks_like_email("a@b.c"));
        assert!(!looks_like_email("ana@tienda"));
        assert!(!looks_like_email("@tienda.com"));
        assert!(!looks_like_email("ana@.com"));
        assert!(!looks_like_email("ana@tienda."));
        assert!(!looks_like_email("ana @tienda.com"));
    }

    #[test]
    fn test_empty_form_reports_required_fields() {
        let mut form = LoginForm::new(AuthMode::Register);

        assert!(form.validate().is_none());
        assert_eq!(form.errors().email, Some(ValidationError::EmailRequired));
        assert_eq!(form.errors().password, Some(ValidationError::PasswordRequired));
        assert_eq!(form.errors().name, Some(ValidationError::NameRequired));
    }

    #[test]
    fn test_invalid_values() {
        let mut form = filled(AuthMode::Login, "ana@tienda", "123");

        assert!(form.validate().is_none());
        assert_eq!(form.errors().email, Some(ValidationError::EmailInvalid));
        assert_eq!(
            form.errors().password,
            Some(ValidationError::PasswordTooShort { min: 6 })
        );
        assert_eq!(form.errors().name, None);
    }

    #[test]
    fn test_editing_clears_only_that_error() {
        let mut form = LoginForm::new(AuthMode::Login);
        form.validate();

        form.set(Field::Email, "a");

        assert_eq!(form.errors().email, None);
        assert_eq!(form.errors().password, Some(ValidationError::PasswordRequired));
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let context = StoreContext::with_backend(backend.clone());
        context.initialize().await;
        let calls = backend.calls();
        let navigator = MemoryNavigator::default();

        let mut form = filled(AuthMode::Login, "", "");
        let outcome = form.submit(&context, &navigator).await;

        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert_eq!(backend.calls(), calls);
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_successful_login_navigates_to_admin() {
        let context = context_with_account().await;
        let navigator = MemoryNavigator::new("/login");

        let mut form = filled(AuthMode::Login, " ana@tienda.com ", PASSWORD);
        let outcome = form.submit(&context, &navigator).await;

        assert_eq!(outcome, SubmitOutcome::SignedIn);
        assert_eq!(navigator.current().path, "/admin");
        assert_eq!(navigator.depth(), 1);
        assert!(context.snapshot().is_authenticated());
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_wrong_password_shows_translated_error() {
        let context = context_with_account().await;
        let navigator = MemoryNavigator::new("/login");

        let mut form = filled(AuthMode::Login, "ana@tienda.com", "incorrecta");
        let outcome = form.submit(&context, &navigator).await;

        assert_eq!(outcome, SubmitOutcome::Rejected);
        assert_eq!(form.general_error(), Some(messages::AUTH_INVALID_CREDENTIALS));
        assert_eq!(navigator.navigations(), 0);
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_register_taken_email() {
        let context = context_with_account().await;
        let navigator = MemoryNavigator::new("/login?register=true");

        let mut form = LoginForm::from_location(&navigator.current());
        form.set(Field::Name, "Ana");
        form.set(Field::Email, "ana@tienda.com");
        form.set(Field::Password, PASSWORD);
        let outcome = form.submit(&context, &navigator).await;

        assert_eq!(outcome, SubmitOutcome::Rejected);
        assert_eq!(form.general_error(), Some(messages::AUTH_ALREADY_REGISTERED));
    }

    #[test]
    fn test_unrecognized_error_is_generic() {
        let navigator = MemoryNavigator::default();
        let mut form = filled(AuthMode::Login, "ana@tienda.com", PASSWORD);
        form.begin_submit().unwrap();

        let err = SessionError::from(AuthError::from_backend_message("upstream timeout"));
        let outcome = form.finish_submit(Err(err), &navigator);

        assert_eq!(outcome, SubmitOutcome::Rejected);
        assert_eq!(form.general_error(), Some(messages::AUTH_GENERIC));
    }

    #[test]
    fn test_double_submit_is_rejected() {
        let mut form = filled(AuthMode::Login, "ana@tienda.com", PASSWORD);

        assert!(form.begin_submit().is_ok());
        assert!(form.is_submitting());
        assert_eq!(form.submit_label(), messages::LOGIN_SUBMITTING);
        assert!(matches!(form.begin_submit(), Err(SubmitOutcome::Busy)));
    }

    #[test]
    fn test_toggle_mode_clears_form_and_updates_query() {
        let navigator = MemoryNavigator::new("/login?ref=mail");
        let mut form = LoginForm::from_location(&navigator.current());
        assert_eq!(form.mode(), AuthMode::Login);
        form.set(Field::Email, "ana@");
        form.validate();

        form.toggle_mode(&navigator);

        assert_eq!(form.mode(), AuthMode::Register);
        assert_eq!(form.value(Field::Email), "");
        assert!(form.errors().is_empty());
        assert_eq!(form.title(), messages::REGISTER_TITLE);
        assert_eq!(form.toggle_label(), messages::LOGIN_TITLE);
        assert_eq!(navigator.current().to_string(), "/login?ref=mail&register=true");

        form.toggle_mode(&navigator);

        assert_eq!(form.mode(), AuthMode::Login);
        assert_eq!(navigator.current().to_string(), "/login?ref=mail");
        assert_eq!(navigator.navigations(), 0);
    }

    #[test]
    fn test_register_flag_must_be_true() {
        let form = LoginForm::from_location(&Location::parse("/login?register=1"));
        assert_eq!(form.mode(), AuthMode::Login);
    }
}
