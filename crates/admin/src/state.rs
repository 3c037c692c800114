//! Session/store context shared across screens.
//!
//! [`StoreContext`] is constructed once at startup and cloned into every
//! consumer. It owns the only [`SessionState`] and publishes each change as
//! a whole new snapshot through a `watch` channel, so readers never see a
//! half-applied update.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use tutaviendo_core::{Email, Password, Plan, StoreId};

use crate::error::{SessionError, clear_sentry_user, report_unexpected, set_sentry_user};
use crate::models::{AuthStatus, SessionState, Store, StoreUpdate, User};
use crate::services::{AuthBackend, AuthError, StoreBackend};

/// The session context.
#[derive(Clone)]
pub struct StoreContext {
    inner: Arc<StoreContextInner>,
}

struct StoreContextInner {
    auth: Arc<dyn AuthBackend>,
    stores: Arc<dyn StoreBackend>,
    state: watch::Sender<Arc<SessionState>>,
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("state", &*self.snapshot())
            .finish_non_exhaustive()
    }
}

impl StoreContext {
    /// Create an uninitialized context over the given backends.
    #[must_use]
    pub fn new(auth: Arc<dyn AuthBackend>, stores: Arc<dyn StoreBackend>) -> Self {
        let (state, _) = watch::channel(Arc::new(SessionState::default()));
        Self {
            inner: Arc::new(StoreContextInner {
                auth,
                stores,
                state,
            }),
        }
    }

    /// Create a context over one object implementing both backends.
    #[must_use]
    pub fn with_backend<B>(backend: Arc<B>) -> Self
    where
        B: AuthBackend + StoreBackend + 'static,
    {
        Self::new(backend.clone(), backend)
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SessionState> {
        self.inner.state.borrow().clone()
    }

    /// A receiver that observes every future snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionState>> {
        self.inner.state.subscribe()
    }

    /// The plan of `user`, the free plan if there is no user.
    #[must_use]
    pub fn get_user_plan(user: Option<&User>) -> Plan {
        user.map(User::plan).unwrap_or_default()
    }

    /// The plan of the signed-in user.
    #[must_use]
    pub fn current_plan(&self) -> Plan {
        Self::get_user_plan(self.snapshot().user())
    }

    /// Restore a persisted session.
    ///
    /// Only the first call does anything; later calls return the snapshot
    /// as is. A failed restore ends signed out.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Arc<SessionState> {
        let started = self.commit_if(|state| {
            (*state.status() == AuthStatus::Uninitialized)
                .then(|| state.with_status(AuthStatus::Initializing).with_loading(true))
        });
        if !started {
            return self.snapshot();
        }

        let next = match self.inner.auth.restore_session().await {
            Ok(Some(user)) => {
                tracing::info!(user_id = %user.id, "Session restored");
                set_sentry_user(user.id, &user.email);
                let stores = self.load_stores(&user).await;
                SessionState::signed_in(user, stores)
            }
            Ok(None) => {
                tracing::debug!("No persisted session");
                SessionState::signed_out()
            }
            Err(err) => {
                report_unexpected(&SessionError::from(err), "initialize");
                SessionState::signed_out()
            }
        };

        self.commit(|state| next.with_epoch(state.epoch()));
        self.snapshot()
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInitialized` before [`Self::initialize`]
    /// has finished, `SessionError::Busy` while another login or register
    /// is in flight, `SessionError::SignedOut` if [`Self::logout`] finished
    /// first, or `SessionError::Auth` if the backend refuses. Only the
    /// loading flag changes on failure.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &Password) -> Result<(), SessionError> {
        let epoch = self.begin_auth()?;
        let result = self.inner.auth.sign_in(email, password).await;
        self.finish_auth(epoch, result, "login").await
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Same as [`Self::login`]; `SessionError::Auth` also covers an email
    /// that is already registered.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        email: &Email,
        password: &Password,
        name: &str,
    ) -> Result<(), SessionError> {
        let epoch = self.begin_auth()?;
        let result = self.inner.auth.sign_up(email, password, name).await;
        self.finish_auth(epoch, result, "register").await
    }

    /// Sign out.
    ///
    /// Local state is reset whatever the backend answers; a backend failure
    /// is returned afterwards. Calling this while signed out is harmless.
    /// A login or register still in flight is discarded when it resolves.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInitialized` before [`Self::initialize`]
    /// has finished, or `SessionError::Auth` if the backend sign-out failed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), SessionError> {
        if !self.snapshot().is_initialized() {
            return Err(SessionError::NotInitialized);
        }

        let result = self.inner.auth.sign_out().await;

        self.commit(SessionState::signed_out_after);
        clear_sentry_user();

        match result {
            Ok(()) => {
                tracing::info!("Signed out");
                Ok(())
            }
            Err(err) => {
                let err = SessionError::from(err);
                report_unexpected(&err, "logout");
                Err(err)
            }
        }
    }

    /// Persist `update` for the current store.
    ///
    /// On success the current store is replaced by the record the backend
    /// returned, which is also returned here. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAuthenticated` or
    /// `SessionError::NoCurrentStore` if there is nothing to update, or
    /// `SessionError::Persistence` if the backend refuses the write.
    #[instrument(skip(self, update))]
    pub async fn update_store(&self, update: &StoreUpdate) -> Result<Store, SessionError> {
        let state = self.snapshot();
        if !state.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        let current = state.current_store().ok_or(SessionError::NoCurrentStore)?;
        let epoch = state.epoch();
        if update.is_empty() {
            return Ok(current.clone());
        }

        let saved = self
            .inner
            .stores
            .update_store(current.id, update)
            .await
            .map_err(|err| {
                let err = SessionError::from(err);
                report_unexpected(&err, "update_store");
                err
            })?;

        let store = saved.clone();
        // A logout while the write was in flight wins.
        self.commit_if(|state| {
            (state.epoch() == epoch)
                .then(|| state.with_store(store))
                .flatten()
        });
        tracing::info!(store_id = %saved.id, "Store updated");
        Ok(saved)
    }

    /// Make another owned store current.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownStore` if the signed-in user does not
    /// own `store_id`; the snapshot is unchanged.
    #[instrument(skip(self))]
    pub fn select_store(&self, store_id: StoreId) -> Result<(), SessionError> {
        if self.commit_if(|state| state.with_current_store(store_id)) {
            Ok(())
        } else {
            Err(SessionError::UnknownStore(store_id))
        }
    }

    /// Mark an auth operation as in flight and return the epoch it runs
    /// under.
    fn begin_auth(&self) -> Result<u64, SessionError> {
        let mut refusal = SessionError::NotInitialized;
        let mut epoch = 0;
        let started = self.commit_if(|state| {
            if !state.is_initialized() {
                return None;
            }
            if state.is_loading() {
                refusal = SessionError::Busy;
                return None;
            }
            epoch = state.epoch();
            Some(state.with_loading(true))
        });
        if started { Ok(epoch) } else { Err(refusal) }
    }

    /// Publish the outcome of a sign-in or sign-up started under `epoch`.
    async fn finish_auth(
        &self,
        epoch: u64,
        result: Result<User, AuthError>,
        operation: &str,
    ) -> Result<(), SessionError> {
        let user = match result {
            Ok(user) => user,
            Err(err) => {
                self.commit_if(|state| {
                    (state.epoch() == epoch).then(|| state.with_loading(false))
                });
                let err = SessionError::from(err);
                report_unexpected(&err, operation);
                return Err(err);
            }
        };

        let stores = self.load_stores(&user).await;
        let (user_id, email) = (user.id, user.email.clone());
        let committed = self.commit_if(|state| {
            (state.epoch() == epoch)
                .then(|| SessionState::signed_in(user, stores).with_epoch(epoch))
        });

        if committed {
            tracing::info!(%user_id, operation, "Signed in");
            set_sentry_user(user_id, &email);
            return Ok(());
        }

        // Logged out meanwhile; end the backend session we just opened
        // unless a newer sign-in has taken over.
        tracing::info!(%user_id, operation, "Discarding sign-in that finished after logout");
        let current = self.snapshot();
        if !current.is_authenticated()
            && !current.is_loading()
            && let Err(err) = self.inner.auth.sign_out().await
        {
            report_unexpected(&SessionError::from(err), "discard_sign_in");
        }
        Err(SessionError::SignedOut)
    }

    /// Load the stores of a freshly signed-in user.
    ///
    /// A failed listing leaves the user signed in without stores.
    async fn load_stores(&self, user: &User) -> Vec<Store> {
        match self.inner.stores.list_stores(user.id).await {
            Ok(stores) => {
                tracing::debug!(count = stores.len(), "Stores loaded");
                stores
            }
            Err(err) => {
                report_unexpected(&SessionError::from(err), "list_stores");
                Vec::new()
            }
        }
    }

    /// Replace the snapshot. Every change goes through here or
    /// [`Self::commit_if`].
    fn commit(&self, f: impl FnOnce(&SessionState) -> SessionState) {
        self.inner.state.send_modify(|state| {
            *state = Arc::new(f(state));
        });
    }

    /// Replace the snapshot if `f` returns one. Returns whether it did.
    fn commit_if(&self, f: impl FnOnce(&SessionState) -> Option<SessionState>) -> bool {
        self.inner.state.send_if_modified(|state| match f(state) {
            Some(next) => {
                *state = Arc::new(next);
                true
            }
            None => false,
        })
    }
}
