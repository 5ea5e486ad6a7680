//! Bling OAuth callback relay.
//!
//! Bling redirects the admin's popup here. The page hands the result back to
//! the admin window that opened it (`postMessage`), mirrors it into local
//! storage for tabs that lost their opener, and otherwise navigates to the
//! admin integration page with the parameters in the query string.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use tracing::instrument;
use url::Url;

use smilepet_core::storage::keys::BLING_CALLBACK;

use crate::state::AppState;

/// Message type posted to the opener window.
pub const MESSAGE_TYPE: &str = "bling_callback";

/// Callback page.
#[derive(Template, WebTemplate)]
#[template(path = "bling/callback.html")]
pub struct CallbackPage {
    /// Payload as script-safe JSON.
    pub payload_json: String,
    /// Opener origin as script-safe JSON; `null` skips `postMessage`.
    pub origin_json: String,
    /// Fallback navigation target as script-safe JSON.
    pub redirect_json: String,
    /// Local storage key as script-safe JSON.
    pub storage_key_json: String,
    pub success: bool,
}

/// Serialize `value` as JSON that can sit inside an inline `<script>`.
#[must_use]
pub fn script_safe_json(value: &Value) -> String {
    let mut out = String::new();
    for c in value.to_string().chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

/// Origin of `base_url`, or `None` if it has no tuple origin.
fn opener_origin(base_url: &str) -> Option<String> {
    let origin = Url::parse(base_url).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// `redirect_path` with the callback parameters appended.
fn redirect_url(
    redirect_path: &str,
    params: &BTreeMap<String, String>,
    token_error: Option<&str>,
) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("bling", "callback");
    for (key, value) in params {
        query.append_pair(key, value);
    }
    if let Some(error) = token_error {
        query.append_pair("token_error", error);
    }

    let separator = if redirect_path.contains('?') { '&' } else { '?' };
    format!("{redirect_path}{separator}{}", query.finish())
}

async fn handle(state: &AppState, params: BTreeMap<String, String>) -> Response {
    let mut payload = Map::new();
    for (key, value) in &params {
        payload.insert(key.clone(), json!(value));
    }
    payload.insert("type".to_string(), json!(MESSAGE_TYPE));

    let code = params.get("code").map(String::as_str).filter(|c| !c.is_empty());
    let mut token_error = None;

    match (code, state.bling()) {
        (Some(code), Some(bling)) => match bling.exchange_code(code).await {
            Ok(tokens) => {
                tracing::info!("Bling authorization code exchanged");
                payload.insert("tokens".to_string(), tokens);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Bling token exchange failed");
                token_error = Some(e.to_string());
            }
        },
        (Some(_), None) => {
            tracing::debug!("Bling credentials not configured; relaying code only");
        }
        (None, _) => {
            tracing::warn!(
                error = params.get("error").map(String::as_str),
                "Bling callback without authorization code"
            );
        }
    }

    if let Some(error) = &token_error {
        payload.insert("token_error".to_string(), json!(error));
    }

    let success = code.is_some() && token_error.is_none();
    let config = state.config();
    let origin = opener_origin(&config.base_url);
    if origin.is_none() {
        tracing::warn!(base_url = %config.base_url, "No opener origin; Bling result will not be posted");
    }
    let page = CallbackPage {
        payload_json: script_safe_json(&Value::Object(payload)),
        origin_json: script_safe_json(&json!(origin)),
        redirect_json: script_safe_json(&json!(redirect_url(
            &config.bling.redirect_path,
            &params,
            token_error.as_deref()
        ))),
        storage_key_json: script_safe_json(&json!(BLING_CALLBACK)),
        success,
    };

    ([(header::CACHE_CONTROL, "no-store")], page).into_response()
}

/// `GET /api/bling/callback`
#[instrument(skip(state, params))]
pub async fn callback_get(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    handle(&state, params).await
}

/// `POST /api/bling/callback`
#[instrument(skip(state, params))]
pub async fn callback_post(
    State(state): State<AppState>,
    Form(params): Form<BTreeMap<String, String>>,
) -> Response {
    handle(&state, params).await
}
