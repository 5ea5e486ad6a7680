//! Typed records exchanged with the remote API.
//!
//! Field names follow the API's Portuguese payloads through serde aliases;
//! everything is re-serialized in camelCase English for the SPA.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use smilepet_core::{
    BillingDetails, CartLineItem, CategoryId, CheckoutSummary, Email, OrderId, PaymentStatus,
    ProductId, ShippingQuote,
};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    #[serde(alias = "nome", alias = "title")]
    pub name: String,
    #[serde(alias = "preco", default)]
    pub price: Decimal,
    #[serde(alias = "precoPromocional", alias = "promoPrice", default)]
    pub sale_price: Option<Decimal>,
    #[serde(alias = "descricao", default)]
    pub description: Option<String>,
    #[serde(alias = "imagem", alias = "image", default)]
    pub image_url: Option<String>,
    #[serde(alias = "categoriaId", alias = "category_id", default)]
    pub category_id: Option<CategoryId>,
    #[serde(alias = "estoque", default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub ncm: Option<String>,
    #[serde(alias = "variacoes", default)]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Price a shopper pays right now.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        match self.sale_price {
            Some(sale) if sale > Decimal::ZERO && sale < self.price => sale,
            _ => self.price,
        }
    }
}

/// A purchasable variant (e.g. pack size).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    #[serde(alias = "nome", alias = "label")]
    pub name: String,
    #[serde(alias = "preco", default)]
    pub price: Option<Decimal>,
    #[serde(alias = "estoque", default)]
    pub stock: Option<i64>,
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: CategoryId,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(alias = "imagem", alias = "image", default)]
    pub image_url: Option<String>,
}

/// Login form posted by the SPA.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(alias = "senha")]
    pub password: String,
}

/// Order submitted to the remote checkout endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOrder {
    pub client_id: Option<String>,
    pub email: Email,
    pub billing: BillingDetails,
    pub items: Vec<CartLineItem>,
    pub shipping: Option<ShippingQuote>,
    pub subtotal: Decimal,
    pub shipping_price: Decimal,
    pub total: Decimal,
    /// Provider-specific payment data (card token, installments, PIX, ...),
    /// passed through untouched.
    pub payment: Value,
}

impl CheckoutOrder {
    /// Assemble an order from the checkout summary.
    #[must_use]
    pub fn new(
        summary: CheckoutSummary,
        shipping: Option<ShippingQuote>,
        email: Email,
        billing: BillingDetails,
        client_id: Option<String>,
        payment: Value,
    ) -> Self {
        Self {
            client_id,
            email,
            billing,
            shipping_price: summary.shipping,
            subtotal: summary.subtotal,
            total: summary.total,
            items: summary.items,
            shipping,
            payment,
        }
    }
}

/// What the remote checkout endpoint reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOutcome {
    pub order_id: Option<OrderId>,
    pub status: PaymentStatus,
    pub status_detail: Option<String>,
    /// PIX/boleto instructions or similar, relayed to the SPA.
    pub instructions: Option<Value>,
}

impl CheckoutOutcome {
    /// Read the outcome from a normalized response record.
    #[must_use]
    pub fn from_record(record: &Value) -> Self {
        let text = |keys: &[&str]| {
            keys.iter().find_map(|key| match record.get(*key)? {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        };

        let status = text(&["status", "paymentStatus"])
            .and_then(|s| s.parse::<PaymentStatus>().ok())
            .unwrap_or(PaymentStatus::Unknown);

        Self {
            order_id: text(&["orderId", "pedidoId", "id"]).map(OrderId::new),
            status,
            status_detail: text(&["status_detail", "statusDetail"]),
            instructions: ["point_of_interaction", "pix", "boleto"]
                .iter()
                .find_map(|key| record.get(*key).cloned()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_from_portuguese_payload() {
        let product: Product = serde_json::from_value(json!({
            "_id": 15,
            "nome": "Ração Premium 15kg",
            "preco": 189.9,
            "precoPromocional": "159.90",
            "imagem": "https://cdn/racao.png",
            "categoriaId": 3,
            "estoque": 12,
            "ncm": "2309.10.00",
            "variacoes": [{"nome": "15kg", "preco": 189.9}]
        }))
        .unwrap();

        assert_eq!(product.id, ProductId::new("15"));
        assert_eq!(product.name, "Ração Premium 15kg");
        assert_eq!(product.effective_price(), Decimal::new(15_990, 2));
        assert_eq!(product.category_id, Some(CategoryId::new("3")));
        assert_eq!(product.variants.len(), 1);
    }

    #[test]
    fn test_effective_price_ignores_invalid_sale() {
        let product: Product =
            serde_json::from_value(json!({"id": "a", "name": "x", "price": "10", "salePrice": "12"}))
                .unwrap();
        assert_eq!(product.effective_price(), Decimal::new(10, 0));
    }

    #[test]
    fn test_checkout_outcome() {
        let outcome = CheckoutOutcome::from_record(&json!({
            "id": 991,
            "status": "rejected",
            "status_detail": "cc_rejected_insufficient_amount"
        }));
        assert_eq!(outcome.order_id, Some(OrderId::new("991")));
        assert_eq!(outcome.status, PaymentStatus::Rejected);
        assert_eq!(
            outcome.status_detail.as_deref(),
            Some("cc_rejected_insufficient_amount")
        );

        let unknown = CheckoutOutcome::from_record(&json!({}));
        assert_eq!(unknown.status, PaymentStatus::Unknown);
    }
}
