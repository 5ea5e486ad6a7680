//! Shopping cart store.
//!
//! The cart is a JSON array of [`CartLineItem`] stored under
//! [`keys::CART`](crate::storage::keys::CART). Every operation re-reads the
//! full list, modifies it and writes the full list back.
//!
//! # Invariants
//!
//! - At most one line per `(id, variant)` pair. Adding an existing pair
//!   increments its quantity.
//! - Every stored line has `quantity >= 1`. Setting a quantity of zero or less
//!   removes the line.
//! - No line holds more than [`MAX_LINE_QUANTITY`] units. Larger adds and
//!   updates are clamped.
//! - Money sums saturate instead of overflowing, so a cart written with absurd
//!   price snapshots still reads back.
//!
//! # Failure semantics
//!
//! Reads never fail: missing or corrupt data is an empty cart, and individual
//! malformed lines are dropped. Write failures are logged and otherwise
//! ignored, so an operation can report a new count that did not persist.
//!
//! # Notifications
//!
//! Mutations emit a [`CartChange`] carrying the new total unit count. Quantity
//! updates and removals accept a `silent` flag for background adjustments
//! (e.g. shipping recalculation) that must not reopen cart UI.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::events::{Listeners, Subscription};
use crate::storage::{self, KeyValueStore, keys};
use crate::tracking::{Tracker, TrackingEvent};
use crate::types::ProductId;

/// Upper bound on the units of a single line.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

/// Upper bound on an accepted unit price (R$ 1.000.000,00).
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// One cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Product identifier.
    pub id: ProductId,
    /// Variant key; empty means "no variant".
    #[serde(default)]
    pub variant: String,
    /// Units of this product/variant. Always at least 1 once stored.
    pub quantity: u32,
    /// Price snapshot taken when the line was first added.
    #[serde(alias = "price")]
    pub unit_price: Decimal,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display image.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "image")]
    pub image_url: Option<String>,
    /// Tax classification code (NCM), carried through to checkout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ncm: Option<String>,
}

impl CartLineItem {
    /// Whether this line is identified by `(id, variant)`.
    #[must_use]
    pub fn matches(&self, id: &ProductId, variant: &str) -> bool {
        self.id == *id && self.variant == variant
    }

    /// `unit_price * quantity`, saturating at the `Decimal` bounds.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Input to [`CartStore::add_to_cart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub id: ProductId,
    #[serde(default)]
    pub variant: String,
    /// Units to add. Zero is treated as one.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(alias = "price")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ncm: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

impl NewCartItem {
    /// A single unit of `id` without variant.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, unit_price: Decimal) -> Self {
        Self {
            id: id.into(),
            variant: String::new(),
            quantity: 1,
            unit_price,
            name: None,
            image_url: None,
            ncm: None,
        }
    }

    /// Set the variant key.
    #[must_use]
    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    /// Set the quantity to add.
    #[must_use]
    pub const fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the NCM code.
    #[must_use]
    pub fn ncm(mut self, ncm: impl Into<String>) -> Self {
        self.ncm = Some(ncm.into());
        self
    }

    /// Whether the price snapshot is within `0..=MAX_UNIT_PRICE`.
    #[must_use]
    pub fn has_valid_price(&self) -> bool {
        !self.unit_price.is_sign_negative() && self.unit_price <= MAX_UNIT_PRICE
    }

    fn into_line(self) -> CartLineItem {
        CartLineItem {
            id: self.id,
            variant: self.variant,
            quantity: self.quantity.clamp(1, MAX_LINE_QUANTITY),
            unit_price: self.unit_price,
            name: self.name.filter(|s| !s.is_empty()),
            image_url: self.image_url.filter(|s| !s.is_empty()),
            ncm: self.ncm.filter(|s| !s.is_empty()),
        }
    }
}

/// Why the cart changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartChangeReason {
    Added,
    Updated,
    Removed,
    Cleared,
    /// Another context wrote the cart; listeners should re-read it.
    External,
}

/// Change notification payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartChange {
    /// Total units in the cart after the change.
    pub count: u32,
    pub reason: CartChangeReason,
}

/// The cart store.
pub struct CartStore {
    storage: Arc<dyn KeyValueStore>,
    listeners: Listeners<CartChange>,
    tracker: Option<Arc<dyn Tracker>>,
}

impl CartStore {
    /// Create a cart store over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            listeners: Listeners::new(),
            tracker: None,
        }
    }

    /// Report `AddToCart` events to `tracker`.
    #[must_use]
    pub fn with_tracker(mut self, tracker: Arc<dyn Tracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Register a change listener.
    #[must_use = "dropping the subscription unsubscribes the listener immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartChange) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Read the stored cart.
    ///
    /// Returns an empty list on missing or corrupt data. Lines that fail to
    /// decode or have zero quantity are skipped.
    #[must_use]
    pub fn get_cart(&self) -> Vec<CartLineItem> {
        let Some(raw) = storage::read_json::<Vec<serde_json::Value>>(&*self.storage, keys::CART)
        else {
            return Vec::new();
        };

        raw.into_iter()
            .filter_map(|value| match serde_json::from_value::<CartLineItem>(value) {
                Ok(line) if line.quantity > 0 => Some(line),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed cart line");
                    None
                }
            })
            .collect()
    }

    /// Overwrite the stored cart with `items`.
    pub fn save_cart(&self, items: &[CartLineItem]) {
        storage::write_json(&*self.storage, keys::CART, items);
    }

    /// Add `item`, merging into an existing `(id, variant)` line.
    ///
    /// A merge increments the quantity, keeps the original price snapshot and
    /// fills in a missing NCM. Returns the new total unit count.
    pub fn add_to_cart(&self, item: NewCartItem) -> u32 {
        let added = item.into_line();
        let mut cart = self.get_cart();

        let line = match cart
            .iter_mut()
            .find(|line| line.matches(&added.id, &added.variant))
        {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .saturating_add(added.quantity)
                    .min(MAX_LINE_QUANTITY);
                if existing.ncm.is_none() {
                    existing.ncm.clone_from(&added.ncm);
                }
                existing.clone()
            }
            None => {
                cart.push(added.clone());
                added.clone()
            }
        };

        self.save_cart(&cart);
        let count = total_units(&cart);
        tracing::debug!(product_id = %line.id, variant = %line.variant, count, "Added to cart");

        self.track_add(&line, added.quantity);
        self.notify(count, CartChangeReason::Added);
        count
    }

    /// Set the quantity of the `(id, variant)` line, removing it when
    /// `quantity <= 0` and clamping it to [`MAX_LINE_QUANTITY`].
    ///
    /// A missing line is left alone. Notifies unless `silent`. Returns the new
    /// total unit count.
    pub fn update_cart_item_quantity(
        &self,
        id: &ProductId,
        variant: &str,
        quantity: i64,
        silent: bool,
    ) -> u32 {
        if quantity <= 0 {
            return self.remove_cart_item(id, variant, silent);
        }

        let mut cart = self.get_cart();
        let Some(line) = cart.iter_mut().find(|line| line.matches(id, variant)) else {
            return total_units(&cart);
        };
        line.quantity = u32::try_from(quantity)
            .unwrap_or(u32::MAX)
            .min(MAX_LINE_QUANTITY);

        self.save_cart(&cart);
        let count = total_units(&cart);
        if !silent {
            self.notify(count, CartChangeReason::Updated);
        }
        count
    }

    /// Remove the `(id, variant)` line.
    ///
    /// Removing a missing line does not write or notify. Notifies unless
    /// `silent`. Returns the new total unit count.
    pub fn remove_cart_item(&self, id: &ProductId, variant: &str, silent: bool) -> u32 {
        let mut cart = self.get_cart();
        let before = cart.len();
        cart.retain(|line| !line.matches(id, variant));

        let count = total_units(&cart);
        if cart.len() == before {
            return count;
        }

        self.save_cart(&cart);
        if !silent {
            self.notify(count, CartChangeReason::Removed);
        }
        count
    }

    /// Total units across all lines.
    #[must_use]
    pub fn get_cart_count(&self) -> u32 {
        total_units(&self.get_cart())
    }

    /// Sum of line totals at their price snapshots.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        subtotal(&self.get_cart())
    }

    /// Empty the cart and notify with count 0.
    pub fn clear_cart(&self) {
        self.save_cart(&[]);
        self.notify(0, CartChangeReason::Cleared);
    }

    /// Re-read the cart after another context wrote it and notify listeners.
    ///
    /// Listeners receive the full current count; no delta is computed.
    pub fn refresh_from_storage(&self) -> u32 {
        let count = self.get_cart_count();
        self.notify(count, CartChangeReason::External);
        count
    }

    fn notify(&self, count: u32, reason: CartChangeReason) {
        self.listeners.emit(&CartChange { count, reason });
    }

    fn track_add(&self, line: &CartLineItem, quantity: u32) {
        let Some(tracker) = &self.tracker else {
            return;
        };
        if let Err(e) = tracker.track(TrackingEvent::add_to_cart(line, quantity)) {
            tracing::debug!(error = %e, "AddToCart tracking dropped");
        }
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("listeners", &self.listeners)
            .field("tracking", &self.tracker.is_some())
            .finish_non_exhaustive()
    }
}

/// Total units across `cart`, saturating.
pub(crate) fn total_units(cart: &[CartLineItem]) -> u32 {
    cart.iter()
        .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
}

/// Sum of line totals across `cart`, saturating.
pub(crate) fn subtotal(cart: &[CartLineItem]) -> Decimal {
    cart.iter()
        .map(CartLineItem::line_total)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use proptest::prelude::*;

    use super::*;
    use crate::storage::{MemoryStorage, StorageError};
    use crate::tracking::TrackingError;

    fn store() -> (Arc<MemoryStorage>, CartStore) {
        let storage = Arc::new(MemoryStorage::new());
        let cart = CartStore::new(storage.clone());
        (storage, cart)
    }

    fn item(id: &str, quantity: u32) -> NewCartItem {
        NewCartItem::new(id, Decimal::new(10, 0)).quantity(quantity)
    }

    fn recorder(cart: &CartStore) -> (Arc<Mutex<Vec<CartChange>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sub = {
            let seen = Arc::clone(&seen);
            cart.subscribe(move |change| seen.lock().unwrap().push(*change))
        };
        (seen, sub)
    }

    #[test]
    fn test_add_same_pair_merges() {
        let (_, cart) = store();
        cart.add_to_cart(item("A", 2));
        let count = cart.add_to_cart(item("A", 3));

        let lines = cart.get_cart();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(count, 5);
    }

    #[test]
    fn test_variants_are_distinct_lines() {
        let (_, cart) = store();
        cart.add_to_cart(item("A", 1).variant("1kg"));
        cart.add_to_cart(item("A", 1).variant("3kg"));
        cart.add_to_cart(item("A", 1));

        assert_eq!(cart.get_cart().len(), 3);
        assert_eq!(cart.get_cart_count(), 3);
    }

    #[test]
    fn test_add_zero_quantity_counts_as_one() {
        let (_, cart) = store();
        assert_eq!(cart.add_to_cart(item("A", 0)), 1);
    }

    #[test]
    fn test_merge_fills_missing_ncm_and_keeps_price() {
        let (_, cart) = store();
        cart.add_to_cart(item("A", 1));
        cart.add_to_cart(
            NewCartItem::new("A", Decimal::new(99, 0))
                .ncm("2309.10.00")
                .quantity(1),
        );
        cart.add_to_cart(item("A", 1).ncm("0000.00.00"));

        let line = &cart.get_cart()[0];
        assert_eq!(line.ncm.as_deref(), Some("2309.10.00"));
        assert_eq!(line.unit_price, Decimal::new(10, 0));
        assert_eq!(line.quantity, 3);
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let (_, cart) = store();
        cart.add_to_cart(item("A", 2));
        cart.add_to_cart(item("B", 1));

        let count = cart.update_cart_item_quantity(&ProductId::new("A"), "", 0, false);
        assert_eq!(count, 1);
        assert_eq!(cart.get_cart_count(), 1);
        assert!(cart.get_cart().iter().all(|l| l.id.as_str() != "A"));
    }

    #[test]
    fn test_update_negative_removes_line() {
        let (_, cart) = store();
        cart.add_to_cart(item("A", 2));
        assert_eq!(
            cart.update_cart_item_quantity(&ProductId::new("A"), "", -4, false),
            0
        );
        assert!(cart.get_cart().is_empty());
    }

    #[test]
    fn test_update_sets_quantity() {
        let (_, cart) = store();
        cart.add_to_cart(item("A", 2));
        assert_eq!(
            cart.update_cart_item_quantity(&ProductId::new("A"), "", 7, false),
            7
        );
    }

    #[test]
    fn test_remove_missing_pair_is_noop() {
        let (storage, cart) = store();
        cart.add_to_cart(item("A", 2));
        let before = storage.get(keys::CART).unwrap();
        let (seen, _sub) = recorder(&cart);

        let count = cart.remove_cart_item(&ProductId::new("A"), "other", false);
        assert_eq!(count, 2);
        assert_eq!(storage.get(keys::CART).unwrap(), before);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_cart() {
        let (_, cart) = store();
        cart.add_to_cart(item("A", 2));
        cart.add_to_cart(item("B", 4));
        let (seen, _sub) = recorder(&cart);

        cart.clear_cart();
        assert!(cart.get_cart().is_empty());
        assert_eq!(cart.get_cart_count(), 0);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![CartChange {
                count: 0,
                reason: CartChangeReason::Cleared
            }]
        );
    }

    #[test]
    fn test_corrupt_or_absent_data_reads_empty() {
        let (storage, cart) = store();
        assert!(cart.get_cart().is_empty());

        storage.set(keys::CART, "{not json").unwrap();
        assert!(cart.get_cart().is_empty());

        storage.set(keys::CART, "{\"id\":\"A\"}").unwrap();
        assert!(cart.get_cart().is_empty());
        assert_eq!(cart.get_cart_count(), 0);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let (storage, cart) = store();
        storage
            .set(
                keys::CART,
                r#"[{"id":1,"quantity":2,"unitPrice":5},{"id":"B"},{"id":"C","quantity":0,"price":"1.00"}]"#,
            )
            .unwrap();

        let lines = cart.get_cart();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id, ProductId::new("1"));
        assert_eq!(lines[0].variant, "");
    }

    #[test]
    fn test_silent_updates_do_not_notify() {
        let (_, cart) = store();
        cart.add_to_cart(item("A", 2));
        let (seen, _sub) = recorder(&cart);

        cart.update_cart_item_quantity(&ProductId::new("A"), "", 3, true);
        cart.remove_cart_item(&ProductId::new("A"), "", true);
        assert!(seen.lock().unwrap().is_empty());
        assert!(cart.get_cart().is_empty());
    }

    #[test]
    fn test_notifications_carry_count() {
        let (_, cart) = store();
        let (seen, sub) = recorder(&cart);

        cart.add_to_cart(item("A", 2));
        cart.update_cart_item_quantity(&ProductId::new("A"), "", 4, false);
        cart.remove_cart_item(&ProductId::new("A"), "", false);
        sub.unsubscribe();
        cart.add_to_cart(item("B", 1));

        let counts: Vec<_> = seen.lock().unwrap().iter().map(|c| (c.count, c.reason)).collect();
        assert_eq!(
            counts,
            vec![
                (2, CartChangeReason::Added),
                (4, CartChangeReason::Updated),
                (0, CartChangeReason::Removed),
            ]
        );
    }

    #[test]
    fn test_refresh_from_storage_reports_external_write() {
        let storage = Arc::new(MemoryStorage::new());
        let tab_a = CartStore::new(storage.clone());
        let tab_b = CartStore::new(storage);
        let (seen, _sub) = recorder(&tab_b);

        tab_a.add_to_cart(item("A", 3));
        assert_eq!(tab_b.refresh_from_storage(), 3);
        assert_eq!(
            seen.lock().unwrap().last().copied(),
            Some(CartChange {
                count: 3,
                reason: CartChangeReason::External
            })
        );
    }

    #[test]
    fn test_subtotal() {
        let (_, cart) = store();
        cart.add_to_cart(NewCartItem::new("A", Decimal::new(1_990, 2)).quantity(2));
        cart.add_to_cart(NewCartItem::new("B", Decimal::new(550, 2)));
        assert_eq!(cart.subtotal(), Decimal::new(4_530, 2));
    }

    struct RecordingTracker(Mutex<Vec<TrackingEvent>>);

    impl Tracker for RecordingTracker {
        fn track(&self, event: TrackingEvent) -> Result<(), TrackingError> {
            self.0.lock().unwrap().push(event);
            Ok(())
        }
    }

    struct FailingTracker;

    impl Tracker for FailingTracker {
        fn track(&self, _event: TrackingEvent) -> Result<(), TrackingError> {
            Err(TrackingError::ChannelClosed)
        }
    }

    #[test]
    fn test_add_emits_tracking_event() {
        let tracker = Arc::new(RecordingTracker(Mutex::new(Vec::new())));
        let cart = CartStore::new(Arc::new(MemoryStorage::new())).with_tracker(tracker.clone());

        cart.add_to_cart(item("A", 2));
        let events = tracker.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name, "AddToCart");
        assert_eq!(events[0].params["contents"][0]["quantity"], 2);
    }

    #[test]
    fn test_tracking_failure_is_swallowed() {
        let cart =
            CartStore::new(Arc::new(MemoryStorage::new())).with_tracker(Arc::new(FailingTracker));
        assert_eq!(cart.add_to_cart(item("A", 1)), 1);
        assert_eq!(cart.get_cart_count(), 1);
    }

    #[test]
    fn test_quantities_are_clamped() {
        let (_, cart) = store();
        assert_eq!(cart.add_to_cart(item("A", u32::MAX)), MAX_LINE_QUANTITY);
        assert_eq!(cart.add_to_cart(item("A", 5)), MAX_LINE_QUANTITY);

        cart.add_to_cart(item("B", 1));
        let count = cart.update_cart_item_quantity(&ProductId::new("B"), "", i64::MAX, false);
        assert_eq!(count, MAX_LINE_QUANTITY * 2);
    }

    #[test]
    fn test_extreme_prices_saturate() {
        let tracker = Arc::new(RecordingTracker(Mutex::new(Vec::new())));
        let cart = CartStore::new(Arc::new(MemoryStorage::new())).with_tracker(tracker.clone());

        assert_eq!(cart.add_to_cart(NewCartItem::new("A", Decimal::MAX).quantity(2)), 2);
        cart.add_to_cart(NewCartItem::new("B", Decimal::MAX));
        cart.update_cart_item_quantity(&ProductId::new("B"), "", 10_000_000_000, false);

        assert_eq!(cart.subtotal(), Decimal::MAX);
        assert_eq!(cart.get_cart().len(), 2);
        let events = tracker.0.lock().unwrap();
        assert_eq!(events[0].params["value"], Decimal::MAX.to_string());
    }

    #[test]
    fn test_price_bounds() {
        assert!(NewCartItem::new("A", Decimal::ZERO).has_valid_price());
        assert!(NewCartItem::new("A", MAX_UNIT_PRICE).has_valid_price());
        assert!(!NewCartItem::new("A", Decimal::new(-1, 2)).has_valid_price());
        assert!(!NewCartItem::new("A", MAX_UNIT_PRICE + Decimal::new(1, 2)).has_valid_price());
    }

    struct BrokenStorage;

    impl KeyValueStore for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Poisoned)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    #[test]
    fn test_storage_failures_degrade_to_empty() {
        let cart = CartStore::new(Arc::new(BrokenStorage));
        assert!(cart.get_cart().is_empty());
        assert_eq!(cart.add_to_cart(item("A", 2)), 2);
        assert_eq!(cart.get_cart_count(), 0);
        cart.clear_cart();
    }

    fn arb_line() -> impl Strategy<Value = CartLineItem> {
        (
            "[a-z0-9]{1,6}",
            prop_oneof![Just(String::new()), "[a-z0-9]{1,3}"],
            1u32..50,
            0i64..100_000,
            proptest::option::of("[a-z]{1,4}"),
        )
            .prop_map(|(id, variant, quantity, cents, ncm)| CartLineItem {
                id: ProductId::new(id),
                variant,
                quantity,
                unit_price: Decimal::new(cents, 2),
                name: None,
                image_url: None,
                ncm,
            })
    }

    proptest! {
        #[test]
        fn prop_same_pair_sums_into_one_line(quantities in proptest::collection::vec(1u32..20, 1..10)) {
            let (_, cart) = store();
            for q in &quantities {
                cart.add_to_cart(item("A", *q).variant("v"));
            }
            let lines = cart.get_cart();
            prop_assert_eq!(lines.len(), 1);
            prop_assert_eq!(lines[0].quantity, quantities.iter().sum::<u32>());
        }

        #[test]
        fn prop_save_then_get_roundtrips(lines in proptest::collection::vec(arb_line(), 0..8)) {
            let (_, cart) = store();
            cart.save_cart(&lines);
            prop_assert_eq!(cart.get_cart(), lines);
        }

        #[test]
        fn prop_pairs_stay_unique(adds in proptest::collection::vec(("[ab]", "[xy]?", 1u32..5), 0..20)) {
            let (_, cart) = store();
            for (id, variant, q) in &adds {
                cart.add_to_cart(item(id, *q).variant(variant.clone()));
            }
            let lines = cart.get_cart();
            for (i, a) in lines.iter().enumerate() {
                for b in lines.iter().skip(i + 1) {
                    prop_assert!(!(a.id == b.id && a.variant == b.variant));
                }
            }
            prop_assert_eq!(cart.get_cart_count(), adds.iter().map(|(_, _, q)| *q).sum::<u32>());
        }
    }
}
