//! Favorites route handlers.

use axum::{Json, extract::Path};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use smilepet_core::ProductId;

use crate::error::Result;
use crate::models::VisitorStorage;

#[derive(Debug, Serialize)]
pub struct FavoritesView {
    pub ids: Vec<ProductId>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteToggled {
    pub id: ProductId,
    pub favorite: bool,
}

/// `GET /api/favorites`
#[instrument(skip(session))]
pub async fn list(session: Session) -> Result<Json<FavoritesView>> {
    let ids = VisitorStorage::load(&session).await?.favorites().list();
    Ok(Json(FavoritesView { ids }))
}

/// `POST /api/favorites/{id}`
#[instrument(skip(session))]
pub async fn toggle(session: Session, Path(id): Path<String>) -> Result<Json<FavoriteToggled>> {
    let id = ProductId::new(id);
    let visitor = VisitorStorage::load(&session).await?;
    let favorite = visitor.favorites().toggle(&id);
    visitor.persist().await?;
    Ok(Json(FavoriteToggled { id, favorite }))
}
