//! Request-scoped models for storefront.

pub mod session;

pub use session::{VisitorStorage, VisitorStorageError, keys as session_keys};
