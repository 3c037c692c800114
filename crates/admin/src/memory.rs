//! In-process backend.
//!
//! Implements both [`AuthBackend`] and [`StoreBackend`] over plain maps.
//! Used by the test suites and by the CLI in offline mode. Failures can be
//! injected per operation; injected failures fire once.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use tutaviendo_core::{Email, Password, StoreId, UserId};

use crate::models::{Store, StoreUpdate, User};
use crate::services::auth::{ALREADY_REGISTERED, EMAIL_NOT_CONFIRMED, INVALID_CREDENTIALS};
use crate::services::{AuthBackend, AuthError, PersistenceError, StoreBackend};

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct Failures {
    sign_in: Option<AuthError>,
    sign_out: Option<AuthError>,
    restore: Option<AuthError>,
    list_stores: Option<PersistenceError>,
    update_store: Option<PersistenceError>,
}

#[derive(Debug, Default)]
struct MemoryData {
    /// Keyed by lowercase email.
    accounts: HashMap<String, Account>,
    /// Stores with their owner, in creation order.
    stores: Vec<(UserId, Store)>,
    /// The signed-in account, if any.
    session: Option<UserId>,
    failures: Failures,
    calls: usize,
}

/// In-memory accounts and stores.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<MemoryData>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a confirmed account and return its user record.
    pub fn add_account(&self, email: &Email, password: &str, name: &str) -> User {
        let user = User {
            id: UserId::random(),
            email: email.clone(),
            name: name.to_string(),
            avatar: None,
            plan_id: Some("free".to_string()),
        };
        self.lock().accounts.insert(
            account_key(email),
            Account {
                user: user.clone(),
                password: password.to_string(),
                confirmed: true,
            },
        );
        user
    }

    /// Mark an account as waiting for email confirmation.
    pub fn set_unconfirmed(&self, email: &Email) {
        if let Some(account) = self.lock().accounts.get_mut(&account_key(email)) {
            account.confirmed = false;
        }
    }

    /// Change the plan of an account.
    pub fn set_plan(&self, user_id: UserId, plan_id: Option<&str>) {
        let mut data = self.lock();
        if let Some(account) = data.accounts.values_mut().find(|a| a.user.id == user_id) {
            account.user.plan_id = plan_id.map(str::to_string);
        }
    }

    /// Give `owner` a store.
    pub fn add_store(&self, owner: UserId, store: Store) {
        self.lock().stores.push((owner, store));
    }

    /// Pretend a session for `user_id` was persisted by an earlier run.
    pub fn persist_session(&self, user_id: UserId) {
        self.lock().session = Some(user_id);
    }

    /// The signed-in account, if any.
    #[must_use]
    pub fn session(&self) -> Option<UserId> {
        self.lock().session
    }

    /// The stored copy of a store.
    #[must_use]
    pub fn store(&self, store_id: StoreId) -> Option<Store> {
        self.lock()
            .stores
            .iter()
            .find(|(_, store)| store.id == store_id)
            .map(|(_, store)| store.clone())
    }

    /// Number of backend operations served so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Fail the next sign-in (or sign-up) with `error`.
    pub fn fail_next_sign_in(&self, error: AuthError) {
        self.lock().failures.sign_in = Some(error);
    }

    /// Fail the next sign-out with `error`.
    pub fn fail_next_sign_out(&self, error: AuthError) {
        self.lock().failures.sign_out = Some(error);
    }

    /// Fail the next session restore with `error`.
    pub fn fail_next_restore(&self, error: AuthError) {
        self.lock().failures.restore = Some(error);
    }

    /// Fail the next store listing with `error`.
    pub fn fail_next_list_stores(&self, error: PersistenceError) {
        self.lock().failures.list_stores = Some(error);
    }

    /// Fail the next store update with `error`.
    pub fn fail_next_update_store(&self, error: PersistenceError) {
        self.lock().failures.update_store = Some(error);
    }

    fn lock(&self) -> MutexGuard<'_, MemoryData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the data and count the call.
    fn begin(&self) -> MutexGuard<'_, MemoryData> {
        let mut data = self.lock();
        data.calls += 1;
        data
    }
}

fn account_key(email: &Email) -> String {
    email.as_str().to_lowercase()
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn sign_in(&self, email: &Email, password: &Password) -> Result<User, AuthError> {
        let mut data = self.begin();
        if let Some(error) = data.failures.sign_in.take() {
            return Err(error);
        }

        let account = data
            .accounts
            .get(&account_key(email))
            .filter(|account| account.password == password.expose())
            .ok_or_else(|| AuthError::from_backend_message(INVALID_CREDENTIALS))?;
        if !account.confirmed {
            return Err(AuthError::from_backend_message(EMAIL_NOT_CONFIRMED));
        }

        let user = account.user.clone();
        data.session = Some(user.id);
        Ok(user)
    }

    async fn sign_up(
        &self,
        email: &Email,
        password: &Password,
        name: &str,
    ) -> Result<User, AuthError> {
        let mut data = self.begin();
        if let Some(error) = data.failures.sign_in.take() {
            return Err(error);
        }

        let key = account_key(email);
        if data.accounts.contains_key(&key) {
            return Err(AuthError::from_backend_message(ALREADY_REGISTERED));
        }

        let user = User {
            id: UserId::random(),
            email: email.clone(),
            name: name.to_string(),
            avatar: None,
            plan_id: Some("free".to_string()),
        };
        data.accounts.insert(
            key,
            Account {
                user: user.clone(),
                password: password.expose().to_string(),
                confirmed: true,
            },
        );
        data.session = Some(user.id);
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut data = self.begin();
        if let Some(error) = data.failures.sign_out.take() {
            return Err(error);
        }
        data.session = None;
        Ok(())
    }

    async fn restore_session(&self) -> Result<Option<User>, AuthError> {
        let mut data = self.begin();
        if let Some(error) = data.failures.restore.take() {
            return Err(error);
        }

        let Some(user_id) = data.session else {
            return Ok(None);
        };
        Ok(data
            .accounts
            .values()
            .find(|account| account.user.id == user_id)
            .map(|account| account.user.clone()))
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn list_stores(&self, owner: UserId) -> Result<Vec<Store>, PersistenceError> {
        let mut data = self.begin();
        if let Some(error) = data.failures.list_stores.take() {
            return Err(error);
        }
        if data.session != Some(owner) {
            return Err(PersistenceError::NotSignedIn);
        }

        Ok(data
            .stores
            .iter()
            .filter(|(store_owner, _)| *store_owner == owner)
            .map(|(_, store)| store.clone())
            .collect())
    }

    async fn update_store(
        &self,
        store_id: StoreId,
        update: &StoreUpdate,
    ) -> Result<Store, PersistenceError> {
        let mut data = self.begin();
        if let Some(error) = data.failures.update_store.take() {
            return Err(error);
        }
        let Some(session) = data.session else {
            return Err(PersistenceError::NotSignedIn);
        };

        let store = data
            .stores
            .iter_mut()
            .find(|(owner, store)| *owner == session && store.id == store_id)
            .map(|(_, store)| store)
            .ok_or(PersistenceError::StoreNotFound(store_id))?;
        update.apply_to(store);
        Ok(store.clone())
    }
}
