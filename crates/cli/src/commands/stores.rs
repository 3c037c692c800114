//! Store listing and selection.

use tracing::info;

use tutaviendo_admin::screens::UserMenu;
use tutaviendo_core::StoreId;

use super::CommandError;
use super::session::Session;

/// List the signed-in user's stores, marking the current one.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` without a session.
pub fn list(session: &Session) -> Result<(), CommandError> {
    let state = session.context.snapshot();
    if !state.is_authenticated() {
        return Err(CommandError::NotSignedIn);
    }

    let current = state.current_store().map(|store| store.id);
    if state.stores().is_empty() {
        info!("No stores yet");
    }
    for store in state.stores() {
        info!(
            id = %store.id,
            name = %store.name,
            products = store.products.len(),
            current = current == Some(store.id),
            "Store"
        );
    }
    Ok(())
}

/// Make `store_id` the current store. The choice is saved with the session.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` without a session, or
/// `CommandError::Session` if the store is not one of the user's.
pub fn select(session: &Session, store_id: StoreId) -> Result<(), CommandError> {
    if !session.context.snapshot().is_authenticated() {
        return Err(CommandError::NotSignedIn);
    }

    let mut menu = UserMenu::new();
    menu.open_store_selector();
    menu.select_store(&session.context, store_id)?;

    if let Some(card) = UserMenu::store_card(&session.context.snapshot()) {
        info!(store = %card.name, "Current store changed");
    }
    Ok(())
}
