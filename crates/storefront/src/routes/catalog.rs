//! Catalog proxy handlers.
//!
//! Products and categories come from the remote API already unwrapped from
//! their envelope, so the SPA always receives a plain array.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use smilepet_core::{CategoryId, ProductId};

use crate::api::{Category, Product};
use crate::error::Result;
use crate::state::AppState;

/// Product list filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Only products in this category.
    #[serde(alias = "categoria")]
    pub category: Option<String>,
    /// Case-insensitive name search.
    #[serde(alias = "busca")]
    pub q: Option<String>,
}

impl ProductQuery {
    fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty())
            && product.category_id.as_ref() != Some(&CategoryId::new(category))
        {
            return false;
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            return product.name.to_lowercase().contains(&q.to_lowercase());
        }
        true
    }
}

/// `GET /api/catalog/products`
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = state.api().list_products().await?;
    Ok(Json(products.into_iter().filter(|p| query.matches(p)).collect()))
}

/// `GET /api/catalog/products/{id}`
#[instrument(skip(state))]
pub async fn product(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    let product = state.api().get_product(&ProductId::new(id)).await?;
    Ok(Json(product))
}

/// `GET /api/catalog/categories`
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.api().list_categories().await?))
}
