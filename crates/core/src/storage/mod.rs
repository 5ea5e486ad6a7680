//! Persistent key-value storage behind the client-side stores.
//!
//! The stores in this crate only ever see the [`KeyValueStore`] trait, which
//! mirrors the browser's local storage: string keys, string (JSON) values,
//! whole-value overwrites and no transactions.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - `RwLock<HashMap>`; used in tests and as the
//!   per-request view of a visitor's cookie session
//! - [`FileStorage`] - a single JSON object file on disk
//!
//! # Concurrency
//!
//! Callers perform read-modify-write sequences with no compare-and-swap.
//! Two writers racing on the same key resolve last-write-wins.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Errors raised by storage backends.
///
/// Stores catch these and degrade to empty state; they surface only to code
/// that talks to a backend directly.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A writer panicked while holding the lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A string key-value store with whole-value overwrite semantics.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Storage key names shared with the browser client.
///
/// Each key holds a JSON-serialized blob with no schema versioning.
pub mod keys {
    /// Cart line items (JSON array).
    pub const CART: &str = "smilepet_cart";

    /// Logged-in user snapshot (JSON object).
    pub const USER: &str = "smilepet_user";

    /// Checkout billing details (JSON object).
    pub const CHECKOUT_BILLING: &str = "smilepet_checkout_billing";

    /// Owner tag for the billing details (user id or email).
    pub const CHECKOUT_BILLING_OWNER: &str = "smilepet_checkout_billing_owner";

    /// Contact email typed at checkout.
    pub const CHECKOUT_EMAIL: &str = "smilepet_checkout_email";

    /// Favorited product ids (JSON array).
    pub const FAVORITES: &str = "smilepet_favoritos";

    /// Selected shipping quote (JSON object).
    pub const SHIPPING: &str = "smilepet_shipping";

    /// Display label of the selected shipping quote.
    pub const SHIPPING_LABEL: &str = "smilepet_shipping_label";

    /// Last OAuth callback payload mirrored by the callback page.
    pub const BLING_CALLBACK: &str = "bling_callback";
}

/// Read and decode a JSON value, treating any failure as absent.
///
/// Backend errors and corrupt JSON are logged at `warn` and swallowed.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(
    storage: &dyn KeyValueStore,
    key: &str,
) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read from storage");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding corrupt stored value");
            None
        }
    }
}

/// Encode and write a JSON value, logging and swallowing failures.
///
/// Returns whether the write reached the backend.
pub(crate) fn write_json<T: serde::Serialize + ?Sized>(
    storage: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> bool {
    let result = serde_json::to_string(value)
        .map_err(StorageError::from)
        .and_then(|raw| storage.set(key, &raw));

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to write to storage");
            false
        }
    }
}

/// Remove a key, logging and swallowing failures.
pub(crate) fn remove_key(storage: &dyn KeyValueStore, key: &str) {
    if let Err(e) = storage.remove(key) {
        tracing::warn!(key, error = %e, "Failed to remove from storage");
    }
}
