//! Sign in, sign up, sign out and whoami.

use tracing::{info, warn};

use tutaviendo_admin::messages;
use tutaviendo_admin::screens::{
    AuthMode, Field, LoginForm, LogoutOutcome, SubmitOutcome, UserHeader, UserMenu,
};
use tutaviendo_admin::services::{MemoryNavigator, TracingNotifier};

use super::CommandError;
use super::session::Session;

/// Fill and submit the sign-in form.
///
/// # Errors
///
/// Returns `CommandError::Invalid` with the field errors, or
/// `CommandError::Rejected` with the localized backend refusal.
pub async fn login(session: &Session, email: &str, password: &str) -> Result<(), CommandError> {
    let mut form = LoginForm::new(AuthMode::Login);
    form.set(Field::Email, email);
    form.set(Field::Password, password);
    submit(session, form).await
}

/// Fill and submit the registration form.
///
/// # Errors
///
/// Same as [`login`].
pub async fn register(
    session: &Session,
    email: &str,
    password: &str,
    name: &str,
) -> Result<(), CommandError> {
    let mut form = LoginForm::new(AuthMode::Register);
    form.set(Field::Email, email);
    form.set(Field::Password, password);
    form.set(Field::Name, name);
    submit(session, form).await
}

async fn submit(session: &Session, mut form: LoginForm) -> Result<(), CommandError> {
    let navigator = MemoryNavigator::new("/login");

    match form.submit(&session.context, &navigator).await {
        SubmitOutcome::SignedIn => {
            let header = UserHeader::for_user(session.context.snapshot().user());
            info!(name = %header.name, email = %header.email, "Signed in");
            Ok(())
        }
        SubmitOutcome::Invalid => {
            let errors: Vec<String> = [Field::Email, Field::Password, Field::Name]
                .into_iter()
                .filter_map(|field| form.errors().get(field))
                .map(|err| err.to_string())
                .collect();
            Err(CommandError::Invalid(errors.join("; ")))
        }
        SubmitOutcome::Rejected | SubmitOutcome::Busy => Err(CommandError::Rejected(
            form.general_error()
                .unwrap_or(messages::AUTH_GENERIC)
                .to_string(),
        )),
    }
}

/// Sign out through the user menu.
///
/// The local session is dropped even when the backend call fails.
pub async fn logout(session: &Session) {
    if !session.context.snapshot().is_authenticated() {
        info!("Not signed in");
        return;
    }

    let navigator = MemoryNavigator::new("/admin");
    let mut menu = UserMenu::new();
    match menu.logout(&session.context, &TracingNotifier, &navigator).await {
        LogoutOutcome::SignedOutWithError => warn!("Signed out locally only"),
        LogoutOutcome::SignedOut | LogoutOutcome::Busy => {}
    }
}

/// Show the signed-in user, their plan and the current store.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` without a session.
pub fn whoami(session: &Session) -> Result<(), CommandError> {
    let state = session.context.snapshot();
    if !state.is_authenticated() {
        return Err(CommandError::NotSignedIn);
    }

    let header = UserMenu::header(&state);
    info!(
        name = %header.name,
        email = %header.email,
        initials = %header.initials,
        plan = header.plan_name,
        premium = header.is_premium,
        "Signed in user"
    );

    match UserMenu::store_card(&state) {
        Some(card) => info!(
            store = %card.name,
            id = %card.store_id,
            products = %card.product_label(),
            "Current store"
        ),
        None => warn!("{}", messages::NO_STORE_MESSAGE),
    }
    Ok(())
}
