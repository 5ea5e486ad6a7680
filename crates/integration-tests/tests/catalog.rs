//! Catalog proxy: envelope normalization, filters and errors.

use axum::http::StatusCode;
use serde_json::Value;

use smilepet_integration_tests::{MockUpstream, TestContext, config_for};

fn names(products: &Value) -> Vec<&str> {
    products
        .as_array()
        .map(|items| items.iter().filter_map(|p| p["name"].as_str()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_products_unwrap_nested_envelope() {
    let upstream = MockUpstream::start().await;
    let ctx = TestContext::start(config_for(&upstream)).await;

    let (status, products) = ctx.get_json("/api/catalog/products").await;
    assert_eq!(status, StatusCode::OK);
    // The record without an id is skipped.
    assert_eq!(
        names(&products),
        [
            "Ração Premium Cães Adultos 15kg",
            "Petisco Dental",
            "Arranhador para Gatos"
        ]
    );
    assert_eq!(products[0]["id"], "1");
    assert_eq!(products[0]["salePrice"], "159.90");
}

#[tokio::test]
async fn test_products_filters() {
    let upstream = MockUpstream::start().await;
    let ctx = TestContext::start(config_for(&upstream)).await;

    let (_, by_category) = ctx.get_json("/api/catalog/products?categoria=4").await;
    assert_eq!(names(&by_category), ["Petisco Dental"]);

    let (_, by_text) = ctx.get_json("/api/catalog/products?q=gatos").await;
    assert_eq!(names(&by_text), ["Arranhador para Gatos"]);

    let (_, none) = ctx
        .get_json("/api/catalog/products?category=3&busca=gatos")
        .await;
    assert!(names(&none).is_empty());
}

#[tokio::test]
async fn test_product_detail_and_not_found() {
    let upstream = MockUpstream::start().await;
    let ctx = TestContext::start(config_for(&upstream)).await;

    let (status, product) = ctx.get_json("/api/catalog/products/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["name"], "Petisco Dental");
    assert_eq!(product["price"], "24.90");

    let (status, body) = ctx.get_json("/api/catalog/products/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_product_id_stays_in_its_segment() {
    let upstream = MockUpstream::start().await;
    let ctx = TestContext::start(config_for(&upstream)).await;

    let (status, body) = ctx.get_json("/api/catalog/products/..%2Fclients%2F7").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.get("nome").is_none());
    assert!(body.get("name").is_none());

    let (status, _) = ctx.get_json("/api/catalog/products/2%3Fx=1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_categories() {
    let upstream = MockUpstream::start().await;
    let ctx = TestContext::start(config_for(&upstream)).await;

    let (status, categories) = ctx.get_json("/api/catalog/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&categories), ["Rações", "Petiscos"]);
    assert_eq!(categories[1]["id"], "4");
}
