//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. CORS (the SPA may be served from another origin)
//! 3. `TraceLayer` (request span with `request_id` field)
//! 4. Request ID (record id on the span, echo in response)
//! 5. Session layer (tower-sessions, in-memory store)

pub mod client_context;
pub mod request_id;
pub mod session;

pub use client_context::ClientContext;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer, session_store};
