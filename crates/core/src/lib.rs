//! SmilePet Core - Client-side commerce state.
//!
//! This crate owns the state a shopper carries between page views:
//! - [`cart`] - Cart line items with `(id, variant)` merging and change notifications
//! - [`session`] - Logged-in user snapshot
//! - [`favorites`] - Favorited product ids
//! - [`checkout`] - Billing, contact email and shipping selection
//!
//! # Architecture
//!
//! Every store writes through the [`storage::KeyValueStore`] trait, so the same
//! store works over an in-memory map (tests, per-request session snapshots) or a
//! JSON file on disk. The crate has no HTTP clients and no database access.
//!
//! Stores never fail on storage errors. Reads degrade to empty state and writes
//! are logged and dropped, matching the behavior of browser local storage.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and statuses
//! - [`storage`] - Key-value backends and storage key names
//! - [`events`] - Listener registry used by the stores
//! - [`tracking`] - Marketing event seam fed by the cart
//! - [`payment`] - Customer-facing payment rejection messages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod events;
pub mod favorites;
pub mod payment;
pub mod session;
pub mod storage;
pub mod tracking;
pub mod types;

pub use cart::{
    CartChange, CartChangeReason, CartLineItem, CartStore, MAX_LINE_QUANTITY, MAX_UNIT_PRICE,
    NewCartItem,
};
pub use checkout::{BillingDetails, CheckoutState, CheckoutSummary, ShippingQuote};
pub use events::{Listeners, Subscription};
pub use favorites::FavoritesStore;
pub use session::{SessionStore, UserSession, UserUpdate};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError};
pub use tracking::{Tracker, TrackingError, TrackingEvent};
pub use types::*;
