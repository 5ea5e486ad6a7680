//! Authentication route handlers.
//!
//! Credentials are checked by the remote API; the storefront only keeps the
//! returned user record in the visitor's storage.

use axum::{Json, extract::State};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use smilepet_core::UserSession;

use crate::api::LoginRequest;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::models::VisitorStorage;
use crate::state::AppState;

/// Current user, `null` when logged out.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub user: Option<UserSession>,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

impl From<Option<UserSession>> for UserView {
    fn from(user: Option<UserSession>) -> Self {
        Self {
            is_admin: user.as_ref().is_some_and(UserSession::is_admin),
            user,
        }
    }
}

/// `GET /api/session/user`
#[instrument(skip(session))]
pub async fn current_user(session: Session) -> Result<Json<UserView>> {
    let user = VisitorStorage::load(&session).await?.user().get_user();
    Ok(Json(user.into()))
}

/// `POST /api/auth/login`
#[instrument(skip(state, session, credentials))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<LoginRequest>,
) -> Result<Json<UserView>> {
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(AppError::BadRequest("email and password are required".to_string()));
    }

    let user = state.api().login(&credentials).await?;

    // Rotate the session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session cycle failed: {e}")))?;

    let visitor = VisitorStorage::load(&session).await?;
    visitor.user().set_user(&user);
    visitor.persist().await?;

    if let Some(id) = user.id() {
        set_sentry_user(&id, user.email().as_ref().map(|e| e.as_str()));
    }
    tracing::info!(client_id = ?user.id(), "User logged in");

    Ok(Json(Some(user).into()))
}

/// `POST /api/auth/logout`
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<UserView>> {
    let visitor = VisitorStorage::load(&session).await?;
    visitor.user().clear_user();
    visitor.persist().await?;
    clear_sentry_user();
    Ok(Json(None.into()))
}

/// `GET /api/auth/me`
///
/// Re-fetches the canonical client record and merges it into the stored user.
#[instrument(skip(state, session))]
pub async fn me(State(state): State<AppState>, session: Session) -> Result<Json<UserView>> {
    let visitor = VisitorStorage::load(&session).await?;
    let store = visitor.user();

    let id = store
        .get_user()
        .and_then(|user| user.id())
        .ok_or_else(|| AppError::Unauthorized("not logged in".to_string()))?;

    let fresh = state.api().get_client(&id).await?;
    let user = store.merge_user(fresh);
    visitor.persist().await?;

    Ok(Json(Some(user).into()))
}
