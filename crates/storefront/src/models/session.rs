//! Per-visitor storage carried in the session.
//!
//! The SPA keeps cart, user and checkout state in browser local storage. The
//! server-side equivalent is a string map stored in the visitor's session:
//! each request loads it into a [`MemoryStorage`], runs the core stores over
//! it, and writes the snapshot back. Two concurrent requests from the same
//! visitor resolve last-write-wins, like two browser tabs.

use std::collections::HashMap;
use std::sync::Arc;

use tower_sessions::Session;

use smilepet_core::{
    CartStore, CheckoutState, FavoritesStore, KeyValueStore, MemoryStorage, SessionStore,
};

/// Session keys.
pub mod keys {
    /// Key for the visitor's storage snapshot.
    pub const LOCAL_STORAGE: &str = "local_storage";
}

/// Errors loading or saving the snapshot.
#[derive(Debug, thiserror::Error)]
pub enum VisitorStorageError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("storage error: {0}")]
    Storage(#[from] smilepet_core::StorageError),
}

/// A visitor's storage for the duration of one request.
pub struct VisitorStorage {
    session: Session,
    storage: Arc<MemoryStorage>,
}

impl VisitorStorage {
    /// Load the snapshot from `session`; a missing snapshot starts empty.
    ///
    /// # Errors
    ///
    /// Returns error if the session store fails.
    pub async fn load(session: &Session) -> Result<Self, VisitorStorageError> {
        let entries: HashMap<String, String> = session
            .get(keys::LOCAL_STORAGE)
            .await?
            .unwrap_or_default();

        Ok(Self {
            session: session.clone(),
            storage: Arc::new(MemoryStorage::from_map(entries)),
        })
    }

    /// The snapshot as a store backend.
    #[must_use]
    pub fn storage(&self) -> Arc<dyn KeyValueStore> {
        self.storage.clone()
    }

    #[must_use]
    pub fn cart(&self) -> CartStore {
        CartStore::new(self.storage())
    }

    #[must_use]
    pub fn user(&self) -> SessionStore {
        SessionStore::new(self.storage())
    }

    #[must_use]
    pub fn favorites(&self) -> FavoritesStore {
        FavoritesStore::new(self.storage())
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutState {
        CheckoutState::new(self.storage())
    }

    /// Write the snapshot back to the session.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be read or the session store fails.
    pub async fn persist(self) -> Result<(), VisitorStorageError> {
        let entries = self.storage.snapshot()?;
        self.session.insert(keys::LOCAL_STORAGE, entries).await?;
        Ok(())
    }
}

impl std::fmt::Debug for VisitorStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitorStorage").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use smilepet_core::NewCartItem;

    use super::*;
    use crate::middleware::session_store;

    #[tokio::test]
    async fn test_snapshot_survives_between_requests() {
        let session = Session::new(None, Arc::new(session_store()), None);

        let visitor = VisitorStorage::load(&session).await.unwrap();
        visitor
            .cart()
            .add_to_cart(NewCartItem::new("racao", Decimal::new(9_990, 2)).quantity(2));
        visitor.persist().await.unwrap();

        let next = VisitorStorage::load(&session).await.unwrap();
        assert_eq!(next.cart().get_cart_count(), 2);
    }
}
