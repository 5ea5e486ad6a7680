//! Application state shared across handlers.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::config::StorefrontConfig;
use crate::middleware::ClientContext;
use crate::services::tracking::{self, CapiTracker, QueuedEvent};
use crate::services::{BlingClient, CapiClient};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    bling: Option<BlingClient>,
    capi: Option<CapiClient>,
    tracking_tx: mpsc::Sender<QueuedEvent>,
    tracking_rx: Mutex<Option<mpsc::Receiver<QueuedEvent>>>,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("smilepet-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http_client(config, http))
    }

    /// Create application state around an existing HTTP client.
    #[must_use]
    pub fn with_http_client(config: StorefrontConfig, http: reqwest::Client) -> Self {
        let api = ApiClient::new(http.clone(), &config.api_base_url);
        let bling = BlingClient::from_config(http.clone(), &config.bling);
        let capi = config
            .meta
            .clone()
            .map(|meta| CapiClient::new(http, meta));
        let (tracking_tx, tracking_rx) = tracking::channel();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                bling,
                capi,
                tracking_tx,
                tracking_rx: Mutex::new(Some(tracking_rx)),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Remote REST API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Bling token client, if credentials are configured.
    #[must_use]
    pub fn bling(&self) -> Option<&BlingClient> {
        self.inner.bling.as_ref()
    }

    /// Conversions API client, if credentials are configured.
    #[must_use]
    pub fn capi(&self) -> Option<&CapiClient> {
        self.inner.capi.as_ref()
    }

    /// Tracker for cart events raised in a request with `context`.
    #[must_use]
    pub fn tracker(&self, context: ClientContext) -> Arc<CapiTracker> {
        CapiTracker::new(self.inner.tracking_tx.clone(), context)
    }

    /// Spawn the task that relays cart events to the Conversions API.
    ///
    /// Only the first call spawns; later calls are no-ops. Without CAPI
    /// credentials the queue is drained and discarded.
    pub fn start_tracking_forwarder(&self) {
        let receiver = match self.inner.tracking_rx.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(receiver) = receiver else {
            return;
        };

        match self.capi().cloned() {
            Some(capi) => {
                tokio::spawn(tracking::forward_events(receiver, capi));
            }
            None => {
                tracing::info!("Conversions API not configured; cart events will be discarded");
                tokio::spawn(tracking::discard_events(receiver));
            }
        }
    }
}
