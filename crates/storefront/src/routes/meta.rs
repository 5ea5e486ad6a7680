//! Conversions API relay handler.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::ClientContext;
use crate::services::CapiRequest;
use crate::state::AppState;

/// `POST /api/meta/capi`
///
/// Answers with the Graph API's own status and body.
#[instrument(skip(state, context, request))]
pub async fn capi(
    State(state): State<AppState>,
    context: ClientContext,
    Json(request): Json<CapiRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let capi = state
        .capi()
        .ok_or(AppError::NotConfigured("Meta Conversions API"))?;

    let upstream = capi.send(request, &context).await?;
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(upstream.body)))
}
