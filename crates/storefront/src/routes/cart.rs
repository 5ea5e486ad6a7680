//! Cart route handlers.
//!
//! Every mutation answers with the new unit count and, unless the caller asked
//! for a silent update, the change notification the SPA should rebroadcast
//! (header badge, cart drawer, checkout).

use std::sync::{Arc, Mutex};

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use smilepet_core::{CartChange, CartLineItem, CartStore, NewCartItem, ProductId, Subscription};

use crate::error::{AppError, Result};
use crate::middleware::ClientContext;
use crate::models::VisitorStorage;
use crate::state::AppState;

/// Full cart view.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    pub count: u32,
    pub subtotal: Decimal,
}

/// Count badge.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Result of a cart mutation.
#[derive(Debug, Serialize)]
pub struct CartMutation {
    pub count: u32,
    /// Notification emitted by the store, `null` for silent or no-op writes.
    pub change: Option<CartChange>,
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub id: ProductId,
    #[serde(default)]
    pub variant: String,
    pub quantity: i64,
    #[serde(default)]
    pub silent: bool,
}

/// Line removal request body.
#[derive(Debug, Deserialize)]
pub struct RemoveItem {
    pub id: ProductId,
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub silent: bool,
}

/// Captures the last notification a cart store emits while it is alive.
struct ChangeRecorder {
    last: Arc<Mutex<Option<CartChange>>>,
    _subscription: Subscription,
}

impl ChangeRecorder {
    fn attach(cart: &CartStore) -> Self {
        let last = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&last);
        let subscription = cart.subscribe(move |change| {
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(*change);
            }
        });
        Self {
            last,
            _subscription: subscription,
        }
    }

    fn last(&self) -> Option<CartChange> {
        self.last.lock().ok().and_then(|slot| *slot)
    }
}

/// Run `op` against the visitor's cart, persist, and report the change.
async fn mutate(
    session: &Session,
    tracker: Option<(&AppState, ClientContext)>,
    op: impl FnOnce(&CartStore) -> u32,
) -> Result<CartMutation> {
    let visitor = VisitorStorage::load(session).await?;
    let mut cart = visitor.cart();
    if let Some((state, context)) = tracker {
        cart = cart.with_tracker(state.tracker(context));
    }

    let recorder = ChangeRecorder::attach(&cart);
    let count = op(&cart);
    let change = recorder.last();
    drop(recorder);

    visitor.persist().await?;
    Ok(CartMutation { count, change })
}

/// `GET /api/cart`
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = VisitorStorage::load(&session).await?.cart();
    Ok(Json(CartView {
        items: cart.get_cart(),
        count: cart.get_cart_count(),
        subtotal: cart.subtotal(),
    }))
}

/// `GET /api/cart/count`
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let count = VisitorStorage::load(&session).await?.cart().get_cart_count();
    Ok(Json(CartCount { count }))
}

/// `POST /api/cart/add`
#[instrument(skip(state, session, context, item), fields(product_id = %item.id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    context: ClientContext,
    Json(item): Json<NewCartItem>,
) -> Result<Json<CartMutation>> {
    if !item.has_valid_price() {
        return Err(AppError::BadRequest("Preço inválido".to_string()));
    }
    mutate(&session, Some((&state, context)), |cart| cart.add_to_cart(item))
        .await
        .map(Json)
}

/// `POST /api/cart/update`
#[instrument(skip(session, body), fields(product_id = %body.id, quantity = body.quantity))]
pub async fn update(session: Session, Json(body): Json<UpdateQuantity>) -> Result<Json<CartMutation>> {
    mutate(&session, None, |cart| {
        cart.update_cart_item_quantity(&body.id, &body.variant, body.quantity, body.silent)
    })
    .await
    .map(Json)
}

/// `POST /api/cart/remove`
#[instrument(skip(session, body), fields(product_id = %body.id))]
pub async fn remove(session: Session, Json(body): Json<RemoveItem>) -> Result<Json<CartMutation>> {
    mutate(&session, None, |cart| {
        cart.remove_cart_item(&body.id, &body.variant, body.silent)
    })
    .await
    .map(Json)
}

/// `POST /api/cart/clear`
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartMutation>> {
    mutate(&session, None, |cart| {
        cart.clear_cart();
        0
    })
    .await
    .map(Json)
}
