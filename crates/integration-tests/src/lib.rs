//! Integration tests for the SmilePet storefront.
//!
//! Each test boots the real router on an ephemeral port, next to an
//! in-process stand-in for the remote REST API, Bling and the Graph API.
//! A cookie-carrying `reqwest` client plays the browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p smilepet-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};

use smilepet_storefront::config::{BlingCredentials, MetaConfig, StorefrontConfig};
use smilepet_storefront::state::AppState;

/// Pixel id used by [`with_meta`].
pub const PIXEL_ID: &str = "1234567890";

/// Password the mock API accepts for any email.
pub const PASSWORD: &str = "segredo-do-rex";

/// Requests the mock upstreams received, newest last.
#[derive(Debug, Default)]
pub struct Recorded {
    pub checkouts: Vec<Value>,
    pub token_forms: Vec<Vec<(String, String)>>,
    pub capi_events: Vec<(Vec<(String, String)>, Value)>,
}

/// Shared handle to what the mock upstreams saw.
pub type Recorder = Arc<Mutex<Recorded>>;

/// Bind `router` to an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server");
    });

    format!("http://{addr}")
}

/// A running mock of every upstream the storefront talks to.
pub struct MockUpstream {
    pub base_url: String,
    pub recorded: Recorder,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let recorded = Recorder::default();
        let base_url = serve(upstream_router(Arc::clone(&recorded))).await;
        Self { base_url, recorded }
    }

    pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().expect("recorder lock")
    }
}

fn upstream_router(recorded: Recorder) -> Router {
    Router::new()
        .route("/api/products", get(products))
        .route("/api/products/{id}", get(product))
        .route("/api/categories", get(categories))
        .route("/api/auth/login", post(login))
        .route("/api/clients/{id}", get(client))
        .route("/api/checkout", post(checkout))
        .route("/oauth/token", post(token))
        .route("/v19.0/{pixel}/events", post(capi_events))
        .with_state(recorded)
}

fn catalog() -> Value {
    json!([
        {"_id": 1, "nome": "Ração Premium Cães Adultos 15kg", "preco": 189.9, "precoPromocional": "159.90", "categoriaId": 3},
        {"_id": 2, "nome": "Petisco Dental", "preco": "24.90", "categoriaId": 4},
        {"_id": 3, "nome": "Arranhador para Gatos", "preco": "99.00", "categoriaId": 5},
        {"nome": "registro sem id"}
    ])
}

async fn products() -> Json<Value> {
    Json(json!({"success": true, "data": {"produtos": catalog()}}))
}

async fn product(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    let found = catalog()
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .find(|p| p.get("_id").is_some_and(|v| v.to_string() == id))
                .cloned()
        });
    match found {
        Some(product) => (StatusCode::OK, Json(json!({"data": product}))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Produto não encontrado"})),
        ),
    }
}

async fn categories() -> Json<Value> {
    Json(json!({"categorias": [
        {"_id": 3, "nome": "Rações"},
        {"_id": 4, "nome": "Petiscos"}
    ]}))
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body.get("password").and_then(Value::as_str) != Some(PASSWORD) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Credenciais inválidas"})),
        );
    }
    let email = body.get("email").cloned().unwrap_or(Value::Null);
    (
        StatusCode::OK,
        Json(json!({
            "token": "jwt-abc",
            "user": {"id": 7, "nome": "Ana Souza", "email": email}
        })),
    )
}

async fn client(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if id != "7" {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Cliente não encontrado"})));
    }
    (
        StatusCode::OK,
        Json(json!({"data": {"id": 7, "nome": "Ana Souza", "telefone": "11999990000"}})),
    )
}

/// The card token in `payment.token` picks the outcome.
async fn checkout(State(recorded): State<Recorder>, Json(order): Json<Value>) -> Json<Value> {
    let token = order
        .pointer("/payment/token")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    recorded.lock().expect("recorder lock").checkouts.push(order);

    Json(match token.as_str() {
        "approved" => json!({"payment": {"id": 991, "status": "approved"}}),
        "pix" => json!({"payment": {
            "id": 992,
            "status": "pending",
            "point_of_interaction": {"transaction_data": {"qr_code": "000201..."}}
        }}),
        "insufficient" => json!({"payment": {
            "id": 993,
            "status": "rejected",
            "status_detail": "cc_rejected_insufficient_amount"
        }}),
        _ => json!({"payment": {"id": 994, "status": "rejected"}}),
    })
}

async fn token(
    State(recorded): State<Recorder>,
    Form(form): Form<Vec<(String, String)>>,
) -> (StatusCode, Json<Value>) {
    let bad = form.iter().any(|(k, v)| k == "code" && v == "expired");
    recorded.lock().expect("recorder lock").token_forms.push(form);

    if bad {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"type": "invalid_grant"}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": "bling-access",
            "refresh_token": "bling-refresh",
            "expires_in": 21600,
            "token_type": "Bearer"
        })),
    )
}

async fn capi_events(
    State(recorded): State<Recorder>,
    Query(query): Query<Vec<(String, String)>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorded
        .lock()
        .expect("recorder lock")
        .capi_events
        .push((query, body));
    Json(json!({"events_received": 1, "fbtrace_id": "AbCdEf"}))
}

/// Test configuration pointing every upstream at `upstream`.
#[must_use]
pub fn config_for(upstream: &MockUpstream) -> StorefrontConfig {
    let mut config = StorefrontConfig::for_tests(&format!("{}/api", upstream.base_url));
    config.bling.token_url = format!("{}/oauth/token", upstream.base_url);
    config
}

/// Add Bling credentials to `config`.
#[must_use]
pub fn with_bling(mut config: StorefrontConfig) -> StorefrontConfig {
    config.bling.credentials = Some(BlingCredentials {
        client_id: "bling-client".to_string(),
        client_secret: SecretString::from("bling-secret"),
    });
    config
}

/// Add Conversions API credentials to `config`, aimed at `upstream`.
#[must_use]
pub fn with_meta(mut config: StorefrontConfig, upstream: &MockUpstream) -> StorefrontConfig {
    config.meta = Some(MetaConfig {
        pixel_id: PIXEL_ID.to_string(),
        access_token: SecretString::from("meta-token"),
        api_version: "v19.0".to_string(),
        test_event_code: None,
        graph_url: upstream.base_url.clone(),
    });
    config
}

/// A running storefront plus a browser-like client.
pub struct TestContext {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestContext {
    /// Boot the storefront with `config`, tracking forwarder included.
    pub async fn start(config: StorefrontConfig) -> Self {
        let state = AppState::with_http_client(config, reqwest::Client::new());
        state.start_tracking_forwarder();
        let base_url = serve(smilepet_storefront::app(state)).await;

        Self {
            base_url,
            client: Self::browser(),
        }
    }

    /// A fresh cookie jar, i.e. a new visitor.
    #[must_use]
    pub fn browser() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET `path`, returning status and JSON body.
    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.expect("GET");
        read(resp).await
    }

    /// POST `body` to `path`, returning status and JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST");
        read(resp).await
    }

    /// PUT `body` to `path`, returning status and JSON body.
    pub async fn put_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT");
        read(resp).await
    }
}

async fn read(resp: reqwest::Response) -> (StatusCode, Value) {
    let status = StatusCode::from_u16(resp.status().as_u16()).expect("status code");
    let text = resp.text().await.expect("response body");
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    (status, body)
}
