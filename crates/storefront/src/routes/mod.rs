//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//!
//! # Cart (JSON)
//! GET  /api/cart                    - Lines, unit count and subtotal
//! GET  /api/cart/count              - Unit count
//! POST /api/cart/add                - Add (merges on id + variant)
//! POST /api/cart/update             - Set quantity, <= 0 removes
//! POST /api/cart/remove             - Remove a line
//! POST /api/cart/clear              - Empty the cart
//!
//! # Favorites
//! GET  /api/favorites               - Favorited product ids
//! POST /api/favorites/{id}          - Toggle
//!
//! # Session / Auth
//! GET  /api/session/user            - Stored user
//! POST /api/auth/login              - Remote login, stores the user
//! POST /api/auth/logout             - Forget the user
//! GET  /api/auth/me                 - Refresh the user from the API
//!
//! # Catalog (proxied, cached)
//! GET  /api/catalog/products        - Product list (?category, ?q)
//! GET  /api/catalog/products/{id}   - Product detail
//! GET  /api/catalog/categories      - Category list
//!
//! # Checkout
//! GET  /api/checkout/summary        - Totals, saved billing and email
//! PUT  /api/checkout/shipping       - Select a shipping quote
//! PUT  /api/checkout/billing        - Save billing details and email
//! POST /api/checkout                - Submit order and payment
//!
//! # Integrations
//! GET  /api/bling/callback          - Bling OAuth callback (query)
//! POST /api/bling/callback          - Bling OAuth callback (form)
//! POST /api/meta/capi               - Conversions API relay
//! ```

pub mod auth;
pub mod bling;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod favorites;
pub mod meta;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .route("/categories", get(catalog::categories))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::submit))
        .route("/summary", get(checkout::summary))
        .route("/shipping", put(checkout::set_shipping))
        .route("/billing", put(checkout::set_billing))
}

/// Create all `/api` routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/cart", cart_routes())
        .nest("/api/catalog", catalog_routes())
        .nest("/api/checkout", checkout_routes())
        .route("/api/favorites", get(favorites::list))
        .route("/api/favorites/{id}", post(favorites::toggle))
        .route("/api/session/user", get(auth::current_user))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route(
            "/api/bling/callback",
            get(bling::callback_get).post(bling::callback_post),
        )
        .route("/api/meta/capi", post(meta::capi))
}
