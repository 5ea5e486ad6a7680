//! Checkout route handlers.
//!
//! Shipping, billing and contact email are kept in the visitor's storage
//! between steps. Submission sends the cart at its price snapshots to the
//! remote API, which charges the payment provider.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;

use smilepet_core::payment::{GENERIC_REJECTION, rejection_message};
use smilepet_core::{
    BillingDetails, CheckoutSummary, Email, OrderId, OrderStatus, PaymentStatus, ShippingQuote,
    UserSession,
};

use crate::api::CheckoutOrder;
use crate::error::{AppError, Result};
use crate::models::VisitorStorage;
use crate::state::AppState;

/// Billing form body: the address plus the contact email.
#[derive(Debug, Deserialize)]
pub struct BillingForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub billing: BillingDetails,
}

/// Checkout page state.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub summary: CheckoutSummary,
    pub billing: Option<BillingDetails>,
    pub email: Option<Email>,
}

/// Submission body.
#[derive(Debug, Deserialize)]
pub struct SubmitCheckout {
    /// Provider payment data (card token, installments, method).
    pub payment: Value,
    #[serde(default)]
    pub email: Option<String>,
}

/// Submission result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub order_id: Option<OrderId>,
    pub status: PaymentStatus,
    pub order_status: OrderStatus,
    pub message: Option<String>,
    pub instructions: Option<Value>,
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|e| AppError::BadRequest(format!("E-mail inválido: {e}")))
}

/// Tag for billing data: the logged-in user, else the checkout email.
fn billing_owner(user: Option<&UserSession>, email: Option<&Email>) -> Option<String> {
    user.and_then(UserSession::owner_tag)
        .or_else(|| email.map(|e| e.as_str().to_string()))
}

fn view(visitor: &VisitorStorage) -> CheckoutView {
    let checkout = visitor.checkout();
    let email = checkout.email();
    let user = visitor.user().get_user();
    let billing = billing_owner(user.as_ref(), email.as_ref())
        .and_then(|owner| checkout.billing(&owner));

    CheckoutView {
        summary: checkout.summary(&visitor.cart()),
        billing,
        email,
    }
}

/// `GET /api/checkout/summary`
#[instrument(skip(session))]
pub async fn summary(session: Session) -> Result<Json<CheckoutView>> {
    let visitor = VisitorStorage::load(&session).await?;
    let view = view(&visitor);
    // A billing owner mismatch discards the stale record.
    visitor.persist().await?;
    Ok(Json(view))
}

/// `PUT /api/checkout/shipping`
#[instrument(skip(session, quote), fields(service = %quote.service))]
pub async fn set_shipping(
    session: Session,
    Json(quote): Json<ShippingQuote>,
) -> Result<Json<CheckoutView>> {
    if quote.service.trim().is_empty() || quote.price.is_sign_negative() {
        return Err(AppError::BadRequest("Opção de frete inválida".to_string()));
    }

    let visitor = VisitorStorage::load(&session).await?;
    visitor.checkout().set_shipping(&quote);
    let view = view(&visitor);
    visitor.persist().await?;
    Ok(Json(view))
}

/// `PUT /api/checkout/billing`
#[instrument(skip(session, form))]
pub async fn set_billing(session: Session, Json(form): Json<BillingForm>) -> Result<Json<CheckoutView>> {
    let visitor = VisitorStorage::load(&session).await?;
    let checkout = visitor.checkout();
    let user = visitor.user().get_user();

    let email = match form.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        Some(raw) => Some(parse_email(raw)?),
        None => checkout.email().or_else(|| user.as_ref().and_then(UserSession::email)),
    };
    let owner = billing_owner(user.as_ref(), email.as_ref())
        .ok_or_else(|| AppError::BadRequest("Informe um e-mail para continuar".to_string()))?;

    if let Some(email) = &email {
        checkout.set_email(email);
    }
    checkout.save_billing(&owner, &form.billing);

    let view = view(&visitor);
    visitor.persist().await?;
    Ok(Json(view))
}

/// `POST /api/checkout`
#[instrument(skip(state, session, body))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SubmitCheckout>,
) -> Result<(StatusCode, Json<CheckoutResult>)> {
    let visitor = VisitorStorage::load(&session).await?;
    let cart = visitor.cart();
    let checkout = visitor.checkout();
    let user = visitor.user().get_user();

    let summary = checkout.summary(&cart);
    if summary.is_empty() {
        return Err(AppError::BadRequest("Carrinho vazio".to_string()));
    }

    let email = match body.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        Some(raw) => parse_email(raw)?,
        None => checkout
            .email()
            .or_else(|| user.as_ref().and_then(UserSession::email))
            .ok_or_else(|| AppError::BadRequest("Informe um e-mail para continuar".to_string()))?,
    };
    let billing = billing_owner(user.as_ref(), Some(&email))
        .and_then(|owner| checkout.billing(&owner))
        .ok_or_else(|| AppError::BadRequest("Preencha os dados de cobrança".to_string()))?;

    let order = CheckoutOrder::new(
        summary,
        checkout.shipping(),
        email,
        billing,
        user.as_ref().and_then(UserSession::id).map(|id| id.into_inner()),
        body.payment,
    );
    let outcome = state.api().create_checkout(&order).await?;

    tracing::info!(
        order_id = ?outcome.order_id,
        status = ?outcome.status,
        status_detail = ?outcome.status_detail,
        "Checkout submitted"
    );

    let result = |message: Option<String>| CheckoutResult {
        order_id: outcome.order_id.clone(),
        status: outcome.status,
        order_status: OrderStatus::from(outcome.status),
        message,
        instructions: outcome.instructions.clone(),
    };

    if outcome.status.is_success() {
        checkout.complete(&cart);
        visitor.persist().await?;
        return Ok((StatusCode::OK, Json(result(None))));
    }

    if outcome.status.is_waiting() {
        // The cart stays until the provider confirms payment.
        visitor.persist().await?;
        return Ok((StatusCode::ACCEPTED, Json(result(None))));
    }

    visitor.persist().await?;
    let message = outcome
        .status_detail
        .as_deref()
        .map_or(GENERIC_REJECTION, rejection_message);
    Err(AppError::PaymentRejected(message.to_string()))
}
