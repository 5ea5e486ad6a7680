//! Meta Conversions API (CAPI) relay.
//!
//! Browser pixel events are mirrored server-side so they survive ad blockers.
//! Personal identifiers are normalized and SHA-256 hashed before they leave
//! the server; values that already look like a SHA-256 hex digest are passed
//! through unchanged so the browser may pre-hash.

use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::instrument;

use crate::config::MetaConfig;
use crate::middleware::ClientContext;

/// Errors that can occur when relaying to the Conversions API.
#[derive(Debug, Error)]
pub enum CapiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The event has no name.
    #[error("eventName is required")]
    MissingEventName,
}

/// Event posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapiRequest {
    #[serde(rename = "eventName", alias = "event_name", default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub user_data: Option<Map<String, Value>>,
    #[serde(default)]
    pub event_source_url: Option<String>,
}

/// Status and body returned by the Graph API, relayed verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

/// Conversions API client for one pixel.
#[derive(Clone)]
pub struct CapiClient {
    client: reqwest::Client,
    config: MetaConfig,
}

impl CapiClient {
    #[must_use]
    pub fn new(client: reqwest::Client, config: MetaConfig) -> Self {
        Self { client, config }
    }

    fn events_url(&self) -> String {
        format!(
            "{}/{}/{}/events",
            self.config.graph_url, self.config.api_version, self.config.pixel_id
        )
    }

    /// Build the Graph API payload for `request`.
    ///
    /// # Errors
    ///
    /// Returns `MissingEventName` if the event has no (non-blank) name.
    pub fn build_payload(
        &self,
        request: CapiRequest,
        context: &ClientContext,
    ) -> Result<Value, CapiError> {
        let event_name = request
            .event_name
            .filter(|name| !name.trim().is_empty())
            .ok_or(CapiError::MissingEventName)?;

        let mut user_data = hash_user_data(request.user_data.unwrap_or_default());
        if let Some(ip) = &context.ip {
            user_data.insert("client_ip_address".to_string(), json!(ip));
        }
        if let Some(user_agent) = &context.user_agent {
            user_data.insert("client_user_agent".to_string(), json!(user_agent));
        }

        let mut event = json!({
            "event_name": event_name,
            "event_time": chrono::Utc::now().timestamp(),
            "action_source": "website",
            "user_data": user_data,
            "custom_data": request.params.unwrap_or_else(|| json!({})),
        });
        if let Some(event_id) = request.event_id {
            event["event_id"] = json!(event_id);
        }
        if let Some(url) = request.event_source_url.or_else(|| context.referer.clone()) {
            event["event_source_url"] = json!(url);
        }

        let mut payload = json!({ "data": [event] });
        if let Some(code) = &self.config.test_event_code {
            payload["test_event_code"] = json!(code);
        }
        Ok(payload)
    }

    /// Relay one browser event.
    ///
    /// # Errors
    ///
    /// Returns `MissingEventName` for unnamed events and `Http` if the Graph
    /// API cannot be reached. A non-success answer from Meta is not an error.
    #[instrument(skip(self, request, context), fields(event_name))]
    pub async fn send(
        &self,
        request: CapiRequest,
        context: &ClientContext,
    ) -> Result<UpstreamResponse, CapiError> {
        let payload = self.build_payload(request, context)?;
        tracing::Span::current().record(
            "event_name",
            payload["data"][0]["event_name"].as_str().unwrap_or_default(),
        );

        let response = self
            .client
            .post(self.events_url())
            .query(&[("access_token", self.config.access_token.expose_secret())])
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text }));

        if status >= 400 {
            tracing::warn!(status, body = %body, "Conversions API rejected event");
        } else {
            tracing::debug!(status, "Conversions API accepted event");
        }

        Ok(UpstreamResponse { status, body })
    }
}

/// Whether `value` is already a lowercase or uppercase SHA-256 hex digest.
#[must_use]
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// SHA-256 of `value`, lowercase hex.
#[must_use]
pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Digits only, with the Brazilian country code added to bare DDD numbers.
fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if matches!(digits.len(), 10 | 11) {
        format!("55{digits}")
    } else {
        digits
    }
}

fn hash_identifier(value: &Value, normalize: fn(&str) -> String) -> Option<Value> {
    let hash_one = |raw: &str| {
        if is_sha256_hex(raw) {
            return Some(raw.to_lowercase());
        }
        let normalized = normalize(raw);
        (!normalized.is_empty()).then(|| sha256_hex(&normalized))
    };

    let hashes: Vec<String> = match value {
        Value::String(s) => hash_one(s).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(hash_one)
            .collect(),
        Value::Number(n) => hash_one(&n.to_string()).into_iter().collect(),
        _ => Vec::new(),
    };
    (!hashes.is_empty()).then(|| json!(hashes))
}

/// Hash `em`/`email` and `ph`/`phone`; other fields pass through.
fn hash_user_data(user_data: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in user_data {
        match key.as_str() {
            "em" | "email" => {
                if let Some(hashed) = hash_identifier(&value, normalize_email) {
                    out.insert("em".to_string(), hashed);
                }
            }
            "ph" | "phone" => {
                if let Some(hashed) = hash_identifier(&value, normalize_phone) {
                    out.insert("ph".to_string(), hashed);
                }
            }
            _ => {
                out.insert(key, value);
            }
        }
    }
    out
}
