//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL the SPA is served from (CORS origin, OAuth redirect base)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `API_BASE_URL` - Remote REST API (default: <https://apismilepet.vercel.app/api>)
//! - `BLING_CLIENT_ID` / `BLING_CLIENT_SECRET` - OAuth client credentials (set both or neither)
//! - `BLING_TOKEN_URL` - Token endpoint (default: Bling v3)
//! - `BLING_REDIRECT_PATH` - Where the callback page sends the admin without an opener (default: /admin)
//! - `META_PIXEL_ID` / `META_ACCESS_TOKEN` - Conversions API credentials (set both or neither)
//! - `META_API_VERSION` - Graph API version (default: v19.0)
//! - `META_TEST_EVENT_CODE` - Routes events to the Events Manager test tab
//! - `META_GRAPH_URL` - Graph API host (default: <https://graph.facebook.com>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Default remote REST API base.
pub const DEFAULT_API_BASE_URL: &str = "https://apismilepet.vercel.app/api";

/// Default Bling OAuth token endpoint.
pub const DEFAULT_BLING_TOKEN_URL: &str = "https://www.bling.com.br/Api/v3/oauth/token";

/// Default Graph API version for the Conversions API.
pub const DEFAULT_META_API_VERSION: &str = "v19.0";

/// Default Graph API host.
pub const DEFAULT_META_GRAPH_URL: &str = "https://graph.facebook.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the storefront SPA
    pub base_url: String,
    /// Remote REST API base URL, without trailing slash
    pub api_base_url: String,
    /// Bling OAuth callback configuration
    pub bling: BlingConfig,
    /// Meta Conversions API credentials, if configured
    pub meta: Option<MetaConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Bling OAuth callback configuration.
#[derive(Debug, Clone)]
pub struct BlingConfig {
    /// Client credentials; without them the callback only relays the code.
    pub credentials: Option<BlingCredentials>,
    /// Token endpoint
    pub token_url: String,
    /// Admin path to redirect to when the callback has no opener window
    pub redirect_path: String,
}

/// Bling OAuth client credentials.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct BlingCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for BlingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlingCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Meta Conversions API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct MetaConfig {
    /// Pixel (dataset) id
    pub pixel_id: String,
    /// System user access token
    pub access_token: SecretString,
    /// Graph API version, e.g. `v19.0`
    pub api_version: String,
    /// Test event code; events carrying it show up only in the test tab
    pub test_event_code: Option<String>,
    /// Graph API host, without trailing slash
    pub graph_url: String,
}

impl std::fmt::Debug for MetaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaConfig")
            .field("pixel_id", &self.pixel_id)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("test_event_code", &self.test_event_code)
            .field("graph_url", &self.graph_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        validate_url("STOREFRONT_BASE_URL", &base_url)?;
        let api_base_url = get_env_or_default("API_BASE_URL", DEFAULT_API_BASE_URL);
        validate_url("API_BASE_URL", &api_base_url)?;

        Ok(Self {
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            bling: BlingConfig::from_env()?,
            meta: MetaConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Configuration suitable for tests: localhost, no credentials.
    #[must_use]
    pub fn for_tests(api_base_url: &str) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            bling: BlingConfig {
                credentials: None,
                token_url: DEFAULT_BLING_TOKEN_URL.to_string(),
                redirect_path: "/admin".to_string(),
            },
            meta: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl BlingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let credentials = match (
            get_optional_env("BLING_CLIENT_ID"),
            get_optional_env("BLING_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(_)) => Some(BlingCredentials {
                client_id,
                client_secret: get_validated_secret("BLING_CLIENT_SECRET")?,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar("BLING_CLIENT_SECRET".to_string()));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar("BLING_CLIENT_ID".to_string()));
            }
        };

        let token_url = get_env_or_default("BLING_TOKEN_URL", DEFAULT_BLING_TOKEN_URL);
        validate_url("BLING_TOKEN_URL", &token_url)?;

        let redirect_path = get_env_or_default("BLING_REDIRECT_PATH", "/admin");
        if !redirect_path.starts_with('/') || redirect_path.starts_with("//") {
            return Err(ConfigError::InvalidEnvVar(
                "BLING_REDIRECT_PATH".to_string(),
                "must be an absolute path on this site".to_string(),
            ));
        }

        Ok(Self {
            credentials,
            token_url,
            redirect_path,
        })
    }
}

impl MetaConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        match (
            get_optional_env("META_PIXEL_ID"),
            get_optional_env("META_ACCESS_TOKEN"),
        ) {
            (Some(pixel_id), Some(_)) => {
                if pixel_id.is_empty() || !pixel_id.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ConfigError::InvalidEnvVar(
                        "META_PIXEL_ID".to_string(),
                        "must be numeric".to_string(),
                    ));
                }
                let graph_url = get_env_or_default("META_GRAPH_URL", DEFAULT_META_GRAPH_URL);
                validate_url("META_GRAPH_URL", &graph_url)?;

                Ok(Some(Self {
                    pixel_id,
                    access_token: get_validated_secret("META_ACCESS_TOKEN")?,
                    api_version: get_env_or_default("META_API_VERSION", DEFAULT_META_API_VERSION),
                    test_event_code: get_optional_env("META_TEST_EVENT_CODE"),
                    graph_url: graph_url.trim_end_matches('/').to_string(),
                }))
            }
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar("META_ACCESS_TOKEN".to_string())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar("META_PIXEL_ID".to_string())),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Require an absolute http(s) URL.
fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
