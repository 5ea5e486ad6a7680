//! Bling ERP OAuth token exchange.
//!
//! The admin opens Bling's authorize page in a popup; Bling redirects back to
//! `/api/bling/callback` with a one-time `code`. When client credentials are
//! configured the code is exchanged here so the secret never reaches the
//! browser.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::ExposeSecret;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::config::{BlingConfig, BlingCredentials};

/// Errors that can occur during the token exchange.
#[derive(Debug, Error)]
pub enum BlingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint refused the code.
    #[error("Token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The token endpoint answered with something other than JSON.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Token endpoint client.
#[derive(Clone)]
pub struct BlingClient {
    client: reqwest::Client,
    token_url: String,
    credentials: BlingCredentials,
}

impl BlingClient {
    /// Create a client, or `None` when no credentials are configured.
    #[must_use]
    pub fn from_config(client: reqwest::Client, config: &BlingConfig) -> Option<Self> {
        let credentials = config.credentials.clone()?;
        Some(Self {
            client,
            token_url: config.token_url.clone(),
            credentials,
        })
    }

    fn basic_auth(&self) -> String {
        let raw = format!(
            "{}:{}",
            self.credentials.client_id,
            self.credentials.client_secret.expose_secret()
        );
        format!("Basic {}", STANDARD.encode(raw))
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Returns the token response as Bling sent it.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Bling rejects the code.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<Value, BlingError> {
        let response = self
            .client
            .post(&self.token_url)
            .header(reqwest::header::AUTHORIZATION, self.basic_auth())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("grant_type", "authorization_code"), ("code", code)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = %status, "Bling token exchange failed");
            return Err(BlingError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| BlingError::Parse(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::DEFAULT_BLING_TOKEN_URL;

    fn config(credentials: Option<BlingCredentials>) -> BlingConfig {
        BlingConfig {
            credentials,
            token_url: DEFAULT_BLING_TOKEN_URL.to_string(),
            redirect_path: "/admin".to_string(),
        }
    }

    #[test]
    fn test_no_client_without_credentials() {
        assert!(BlingClient::from_config(reqwest::Client::new(), &config(None)).is_none());
    }

    #[test]
    fn test_basic_auth_header() {
        let client = BlingClient::from_config(
            reqwest::Client::new(),
            &config(Some(BlingCredentials {
                client_id: "id".to_string(),
                client_secret: SecretString::from("secret"),
            })),
        )
        .unwrap();

        // base64("id:secret")
        assert_eq!(client.basic_auth(), "Basic aWQ6c2VjcmV0");
    }
}
