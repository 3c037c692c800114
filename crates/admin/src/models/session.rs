//! Session state snapshot.
//!
//! The session context publishes immutable [`SessionState`] snapshots. The
//! authenticated user lives inside [`AuthStatus::Authenticated`], so a
//! snapshot that reports `is_authenticated()` always has a user.

use tutaviendo_core::StoreId;

use super::store::Store;
use super::user::User;

/// Position of the session in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthStatus {
    /// Created at application start, bootstrap not started.
    #[default]
    Uninitialized,
    /// Bootstrap (session restore) in flight.
    Initializing,
    /// Bootstrap finished, nobody signed in.
    Unauthenticated,
    /// Bootstrap finished, a user is signed in.
    Authenticated(Box<User>),
}

/// One immutable view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    status: AuthStatus,
    is_loading: bool,
    stores: Vec<Store>,
    current_store_id: Option<StoreId>,
    /// Number of logouts so far. Work started under an older epoch must not
    /// publish its result.
    epoch: u64,
}

impl SessionState {
    /// Snapshot for a finished bootstrap with nobody signed in.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            status: AuthStatus::Unauthenticated,
            ..Self::default()
        }
    }

    /// Snapshot for a signed-in user owning `stores`.
    ///
    /// The first store becomes current.
    #[must_use]
    pub fn signed_in(user: User, stores: Vec<Store>) -> Self {
        let current_store_id = stores.first().map(|store| store.id);
        Self {
            status: AuthStatus::Authenticated(Box::new(user)),
            is_loading: false,
            stores,
            current_store_id,
            epoch: 0,
        }
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> &AuthStatus {
        &self.status
    }

    /// Logout counter, see [`Self::signed_out_after`].
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the bootstrap check has completed.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        matches!(
            self.status,
            AuthStatus::Authenticated(_) | AuthStatus::Unauthenticated
        )
    }

    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.status, AuthStatus::Authenticated(_))
    }

    /// Whether an initialize/login/register call is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match &self.status {
            AuthStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Every store owned by the signed-in user.
    #[must_use]
    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    /// The store the admin screens currently operate on.
    #[must_use]
    pub fn current_store(&self) -> Option<&Store> {
        let id = self.current_store_id?;
        self.stores.iter().find(|store| store.id == id)
    }

    /// Signed-out snapshot that ends the session of `self`.
    #[must_use]
    pub fn signed_out_after(&self) -> Self {
        Self {
            epoch: self.epoch.wrapping_add(1),
            ..Self::signed_out()
        }
    }

    /// Same snapshot, tagged with `epoch`.
    #[must_use]
    pub fn with_epoch(self, epoch: u64) -> Self {
        Self { epoch, ..self }
    }

    /// Copy of this snapshot with a different status.
    #[must_use]
    pub fn with_status(&self, status: AuthStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Copy of this snapshot with the loading flag set to `is_loading`.
    #[must_use]
    pub fn with_loading(&self, is_loading: bool) -> Self {
        Self {
            is_loading,
            ..self.clone()
        }
    }

    /// Copy of this snapshot with `store` replacing the owned store of the
    /// same ID. Returns `None` if no such store is owned.
    #[must_use]
    pub fn with_store(&self, store: Store) -> Option<Self> {
        let index = self.stores.iter().position(|s| s.id == store.id)?;
        let mut stores = self.stores.clone();
        if let Some(slot) = stores.get_mut(index) {
            *slot = store;
        }
        Some(Self {
            stores,
            ..self.clone()
        })
    }

    /// Copy of this snapshot with `store_id` as the current store. Returns
    /// `None` if no such store is owned.
    #[must_use]
    pub fn with_current_store(&self, store_id: StoreId) -> Option<Self> {
        self.stores.iter().any(|s| s.id == store_id).then(|| Self {
            current_store_id: Some(store_id),
            ..self.clone()
        })
    }
}
