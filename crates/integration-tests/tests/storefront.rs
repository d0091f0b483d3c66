//! Storefront integration tests.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (tm-cli migrate all)
//! - The storefront running (cargo run -p techmart-storefront)
//! - For the cart test, at least one notebook in the catalog (tm-cli seed catalog)

use reqwest::StatusCode;

use techmart_integration_tests::{client, storefront_base_url};

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_readiness() {
    let resp = client()
        .get(format!("{}/health/ready", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_home_page_renders() {
    let resp = client()
        .get(storefront_base_url())
        .send()
        .await
        .expect("Failed to get home page");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("TechMart"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_unknown_category_is_not_found() {
    let resp = client()
        .get(format!("{}/categories/no-such-category", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get category");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_unknown_product_kind_is_not_found() {
    let resp = client()
        .get(format!("{}/products/tablet/anything", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront, database and a seeded notebook"]
async fn test_add_to_cart_keeps_session() {
    let client = client();
    let base_url = storefront_base_url();

    // Find a notebook slug on the home page
    let home = client
        .get(&base_url)
        .send()
        .await
        .expect("Failed to get home page")
        .text()
        .await
        .expect("Failed to read body");
    let marker = "/products/notebook/";
    let start = home.find(marker).expect("No notebook on the home page") + marker.len();
    let slug: String = home[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .form(&[("kind", "notebook"), ("slug", slug.as_str()), ("quantity", "2")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);

    // The same cookie jar sees the line on the cart page
    let cart = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .text()
        .await
        .expect("Failed to read body");
    assert!(cart.contains(&format!("/products/notebook/{slug}")));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_add_unknown_product_is_not_found() {
    let resp = client()
        .post(format!("{}/cart/add", storefront_base_url()))
        .form(&[("kind", "notebook"), ("slug", "no-such-notebook")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
