//! Marketing event seam.
//!
//! The cart reports `AddToCart` through a [`Tracker`]. Delivery is best
//! effort: a tracker error is logged by the caller and never affects the cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::cart::CartLineItem;
use crate::types::CurrencyCode;

/// Errors a tracker may report.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The delivery channel is closed (e.g. the forwarder task has stopped).
    #[error("tracking channel closed")]
    ChannelClosed,

    /// The tracker rejected the event.
    #[error("tracking rejected: {0}")]
    Rejected(String),
}

/// A marketing event in Meta pixel shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Standard event name (`AddToCart`, `Purchase`, ...).
    #[serde(rename = "eventName")]
    pub event_name: String,
    /// Deduplication id shared between the browser pixel and the server relay.
    pub event_id: String,
    /// Custom data (`value`, `currency`, `contents`, ...).
    pub params: serde_json::Value,
}

impl TrackingEvent {
    /// Build an `AddToCart` event for `quantity` units of `line`.
    #[must_use]
    pub fn add_to_cart(line: &CartLineItem, quantity: u32) -> Self {
        let value = line.unit_price.saturating_mul(Decimal::from(quantity));
        Self {
            event_name: "AddToCart".to_owned(),
            event_id: uuid::Uuid::new_v4().to_string(),
            params: json!({
                "content_ids": [line.id.as_str()],
                "content_type": "product",
                "content_name": line.name,
                "contents": [{
                    "id": line.id.as_str(),
                    "quantity": quantity,
                    "item_price": line.unit_price.to_string(),
                }],
                "value": value.to_string(),
                "currency": CurrencyCode::BRL.code(),
            }),
        }
    }
}

/// Receives marketing events.
pub trait Tracker: Send + Sync {
    /// Deliver `event`.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be handed off.
    fn track(&self, event: TrackingEvent) -> Result<(), TrackingError>;
}
