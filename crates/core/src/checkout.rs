//! Checkout form state: billing details, contact email and shipping choice.
//!
//! Billing details are tagged with the owner (user id or email) that saved
//! them. Reading with a different owner discards the record so one shopper's
//! address never pre-fills another's checkout on a shared device.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{self, CartLineItem, CartStore};
use crate::storage::{self, KeyValueStore, keys};
use crate::types::{Email, Price};

/// Billing and delivery address typed at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillingDetails {
    pub name: String,
    /// CPF or CNPJ.
    pub document: String,
    pub phone: String,
    /// CEP.
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    /// Bairro.
    pub district: String,
    pub city: String,
    /// Two-letter UF.
    pub state: String,
}

impl BillingDetails {
    /// `document` with punctuation stripped.
    #[must_use]
    pub fn document_digits(&self) -> String {
        digits(&self.document)
    }

    /// `postal_code` with punctuation stripped.
    #[must_use]
    pub fn postal_code_digits(&self) -> String {
        digits(&self.postal_code)
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// A selected shipping option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuote {
    /// Service name (e.g. `PAC`, `SEDEX`).
    pub service: String,
    pub price: Decimal,
    #[serde(default)]
    pub delivery_days: Option<u32>,
    #[serde(default)]
    pub carrier: Option<String>,
}

impl ShippingQuote {
    /// Human-readable label, e.g. `PAC - R$ 20,00 (5 dias úteis)`.
    #[must_use]
    pub fn label(&self) -> String {
        let price = if self.price.is_zero() {
            "Grátis".to_owned()
        } else {
            Price::brl(self.price).display()
        };
        match self.delivery_days {
            Some(1) => format!("{} - {price} (1 dia útil)", self.service),
            Some(days) => format!("{} - {price} ({days} dias úteis)", self.service),
            None => format!("{} - {price}", self.service),
        }
    }
}

/// Totals shown on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub items: Vec<CartLineItem>,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub shipping_label: Option<String>,
}

impl CheckoutSummary {
    /// Compute totals for `items` with an optional shipping quote.
    #[must_use]
    pub fn new(items: Vec<CartLineItem>, shipping: Option<&ShippingQuote>) -> Self {
        let subtotal = cart::subtotal(&items);
        let item_count = cart::total_units(&items);
        let shipping_price = shipping.map_or(Decimal::ZERO, |quote| quote.price);

        Self {
            items,
            item_count,
            subtotal,
            shipping: shipping_price,
            total: subtotal.saturating_add(shipping_price),
            shipping_label: shipping.map(ShippingQuote::label),
        }
    }

    /// Whether there is anything to pay for.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Persisted checkout form state.
pub struct CheckoutState {
    storage: Arc<dyn KeyValueStore>,
}

impl CheckoutState {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Save billing details tagged with `owner`.
    pub fn save_billing(&self, owner: &str, billing: &BillingDetails) {
        if storage::write_json(&*self.storage, keys::CHECKOUT_BILLING, billing) {
            storage::write_json(&*self.storage, keys::CHECKOUT_BILLING_OWNER, owner);
        }
    }

    /// Billing details saved by `owner`.
    ///
    /// Details saved by a different owner are removed and `None` is returned.
    #[must_use]
    pub fn billing(&self, owner: &str) -> Option<BillingDetails> {
        let stored_owner: Option<String> =
            storage::read_json(&*self.storage, keys::CHECKOUT_BILLING_OWNER);

        if stored_owner.as_deref() != Some(owner) {
            if stored_owner.is_some() {
                tracing::debug!("Discarding billing details saved by another account");
            }
            self.clear_billing();
            return None;
        }

        storage::read_json(&*self.storage, keys::CHECKOUT_BILLING)
    }

    pub fn clear_billing(&self) {
        storage::remove_key(&*self.storage, keys::CHECKOUT_BILLING);
        storage::remove_key(&*self.storage, keys::CHECKOUT_BILLING_OWNER);
    }

    pub fn set_email(&self, email: &Email) {
        storage::write_json(&*self.storage, keys::CHECKOUT_EMAIL, email);
    }

    #[must_use]
    pub fn email(&self) -> Option<Email> {
        storage::read_json(&*self.storage, keys::CHECKOUT_EMAIL)
    }

    /// Persist `quote` and its display label.
    pub fn set_shipping(&self, quote: &ShippingQuote) {
        storage::write_json(&*self.storage, keys::SHIPPING, quote);
        storage::write_json(&*self.storage, keys::SHIPPING_LABEL, &quote.label());
    }

    #[must_use]
    pub fn shipping(&self) -> Option<ShippingQuote> {
        storage::read_json(&*self.storage, keys::SHIPPING)
    }

    #[must_use]
    pub fn shipping_label(&self) -> Option<String> {
        storage::read_json(&*self.storage, keys::SHIPPING_LABEL)
    }

    pub fn clear_shipping(&self) {
        storage::remove_key(&*self.storage, keys::SHIPPING);
        storage::remove_key(&*self.storage, keys::SHIPPING_LABEL);
    }

    /// Totals for the current cart and shipping selection.
    #[must_use]
    pub fn summary(&self, cart: &CartStore) -> CheckoutSummary {
        CheckoutSummary::new(cart.get_cart(), self.shipping().as_ref())
    }

    /// Reset after a successful payment: empty the cart (notifying its
    /// listeners with count 0) and drop the shipping selection.
    ///
    /// Billing details and email are kept for the next purchase.
    pub fn complete(&self, cart: &CartStore) {
        cart.clear_cart();
        self.clear_shipping();
    }
}

impl std::fmt::Debug for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutState").finish_non_exhaustive()
    }
}
