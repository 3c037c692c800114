//! Store persistence contract.

use async_trait::async_trait;
use thiserror::Error;

use tutaviendo_core::{StoreId, UserId};

use crate::models::{Store, StoreUpdate};

/// Errors that can occur when reading or saving stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// The store does not exist or is not visible to the signed-in user.
    #[error("store not found: {0}")]
    StoreNotFound(StoreId),

    /// The backend refused the write.
    #[error("{0}")]
    Rejected(String),

    /// The backend could not be reached or answered garbage.
    #[error("request failed: {0}")]
    Transport(String),

    /// No signed-in backend session to authorize the request.
    #[error("not signed in")]
    NotSignedIn,
}

/// Hosted database operations on stores.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Every store owned by `owner`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the query fails.
    async fn list_stores(&self, owner: UserId) -> Result<Vec<Store>, PersistenceError>;

    /// Persist `update` and return the store as saved by the backend.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the write fails; nothing is saved.
    async fn update_store(
        &self,
        store_id: StoreId,
        update: &StoreUpdate,
    ) -> Result<Store, PersistenceError>;
}
