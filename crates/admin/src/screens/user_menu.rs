//! User menu in the admin header.

use tutaviendo_core::StoreId;

use crate::error::SessionError;
use crate::messages;
use crate::models::{SessionState, User};
use crate::services::{NavigateOptions, Navigator, Notifier, Route};
use crate::state::StoreContext;

/// Plan badge colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    /// Level 3 and up.
    Premium,
    /// Level 2.
    Standard,
    /// Free plan and anything below level 2.
    Neutral,
}

impl BadgeTone {
    #[must_use]
    pub const fn for_level(level: u8) -> Self {
        match level {
            3.. => Self::Premium,
            2 => Self::Standard,
            _ => Self::Neutral,
        }
    }
}

/// Who is signed in, as shown at the top of the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserHeader {
    pub name: String,
    pub email: String,
    pub initials: String,
    pub avatar: Option<String>,
    pub plan_name: &'static str,
    pub is_premium: bool,
    pub badge: BadgeTone,
}

impl UserHeader {
    /// Header for `user`, with placeholders when there is none.
    #[must_use]
    pub fn for_user(user: Option<&User>) -> Self {
        let plan = StoreContext::get_user_plan(user);
        let name = user.map(|u| u.name.as_str()).filter(|name| !name.trim().is_empty());

        Self {
            name: name.unwrap_or(messages::FALLBACK_USER_NAME).to_string(),
            email: user.map_or_else(
                || messages::FALLBACK_USER_EMAIL.to_string(),
                |u| u.email.to_string(),
            ),
            initials: initials(name.unwrap_or("U")),
            avatar: user.and_then(|u| u.avatar.clone()),
            plan_name: plan.name,
            is_premium: !plan.is_free,
            badge: BadgeTone::for_level(plan.level),
        }
    }
}

/// First letter of the first two words, uppercased.
fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// The current store, as shown above the menu items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCard {
    pub store_id: StoreId,
    pub name: String,
    pub product_count: usize,
}

impl StoreCard {
    /// "N productos".
    #[must_use]
    pub fn product_label(&self) -> String {
        messages::product_count(self.product_count)
    }
}

/// Result of a logout from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// Signed out cleanly.
    SignedOut,
    /// Signed out locally, but the backend call failed.
    SignedOutWithError,
    /// A logout is already in flight.
    Busy,
}

/// Open/closed state of the menu.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserMenu {
    is_open: bool,
    show_store_selector: bool,
    is_logging_out: bool,
}

impl UserMenu {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the dropdown is visible. It hides during logout.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open && !self.is_logging_out
    }

    #[must_use]
    pub const fn is_store_selector_open(&self) -> bool {
        self.show_store_selector
    }

    #[must_use]
    pub const fn is_logging_out(&self) -> bool {
        self.is_logging_out
    }

    /// Click on the avatar button.
    pub fn toggle(&mut self) {
        if !self.is_logging_out {
            self.is_open = !self.is_open;
        }
    }

    /// Click anywhere outside the menu.
    pub fn click_outside(&mut self) {
        self.is_open = false;
        self.show_store_selector = false;
    }

    pub fn open_store_selector(&mut self) {
        self.show_store_selector = true;
    }

    /// The "back" link of the store selector.
    pub fn close_store_selector(&mut self) {
        self.show_store_selector = false;
    }

    /// Pick a store in the selector.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownStore` if the store is not owned by the
    /// signed-in user; the selector stays open.
    pub fn select_store(
        &mut self,
        context: &StoreContext,
        store_id: StoreId,
    ) -> Result<(), SessionError> {
        context.select_store(store_id)?;
        self.show_store_selector = false;
        Ok(())
    }

    /// Follow the "Mi Perfil" link.
    pub fn open_profile(&mut self, navigator: &dyn Navigator) {
        self.is_open = false;
        navigator.navigate(Route::Profile.path(), NavigateOptions::default());
    }

    /// Follow the "Suscripciones" link.
    pub fn open_subscription(&mut self, navigator: &dyn Navigator) {
        self.is_open = false;
        navigator.navigate(Route::Subscription.path(), NavigateOptions::default());
    }

    /// Header for the signed-in user of `state`.
    #[must_use]
    pub fn header(state: &SessionState) -> UserHeader {
        UserHeader::for_user(state.user())
    }

    /// Card for the current store of `state`.
    #[must_use]
    pub fn store_card(state: &SessionState) -> Option<StoreCard> {
        state.current_store().map(|store| StoreCard {
            store_id: store.id,
            name: store.name.clone(),
            product_count: store.products.len(),
        })
    }

    #[must_use]
    pub const fn logout_label(&self) -> &'static str {
        if self.is_logging_out {
            messages::LOGGING_OUT
        } else {
            messages::LOGOUT
        }
    }

    /// Lock the menu for logging out and close it.
    ///
    /// Returns `false` if a logout is already in flight.
    pub fn begin_logout(&mut self) -> bool {
        if self.is_logging_out {
            return false;
        }
        self.is_logging_out = true;
        self.is_open = false;
        true
    }

    /// Notify about the logout result and go to the login screen either way.
    pub fn finish_logout(
        &mut self,
        result: Result<(), SessionError>,
        notifier: &dyn Notifier,
        navigator: &dyn Navigator,
    ) -> LogoutOutcome {
        self.is_logging_out = false;
        self.show_store_selector = false;

        let outcome = match result {
            Ok(()) => {
                notifier.success(messages::LOGOUT_TITLE, messages::LOGOUT_MESSAGE);
                LogoutOutcome::SignedOut
            }
            Err(err) => {
                let message = err.to_string();
                notifier.error(
                    messages::LOGOUT_FAILED_TITLE,
                    messages::or_fallback(&message, messages::LOGOUT_FAILED_MESSAGE),
                );
                LogoutOutcome::SignedOutWithError
            }
        };

        navigator.navigate(Route::Login.path(), NavigateOptions::replace());
        outcome
    }

    /// Sign out through `context`.
    pub async fn logout(
        &mut self,
        context: &StoreContext,
        notifier: &dyn Notifier,
        navigator: &dyn Navigator,
    ) -> LogoutOutcome {
        if !self.begin_logout() {
            return LogoutOutcome::Busy;
        }
        let result = context.logout().await;
        self.finish_logout(result, notifier, navigator)
    }
}
