//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page (newest products of each kind)
//! GET  /health                    - Health check
//! GET  /health/ready              - Readiness check (database)
//!
//! # Catalog
//! GET  /categories/{slug}         - Category detail
//! GET  /products/{kind}/{slug}    - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update               - Update quantity (returns cart_items fragment)
//! POST /cart/remove               - Remove line (returns cart_items fragment)
//! POST /cart/customer             - Attach customer details to the cart
//! GET  /cart/count                - Cart count badge (fragment)
//!
//! # Files
//! GET  /media/*                   - Uploaded product images
//! GET  /static/*                  - Static assets
//! ```

pub mod cart;
pub mod categories;
pub mod home;
pub mod products;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use techmart_core::catalog::Category;

use crate::error::Result;
use crate::state::AppState;

/// Data every full page needs for the shared layout.
pub struct Layout {
    /// Categories for the navigation bar.
    pub categories: Arc<Vec<Category>>,
    /// Number of items in the visitor's cart.
    pub cart_count: i32,
}

impl Layout {
    /// Load the layout data for the current visitor.
    ///
    /// # Errors
    ///
    /// Returns an error if categories or the cart cannot be loaded.
    pub async fn load(state: &AppState, session: &Session) -> Result<Self> {
        let categories = state.categories().await?;
        let cart_count = cart::open_cart(state, session)
            .await?
            .map_or(0, |cart| cart.total_products);
        Ok(Self {
            categories,
            cart_count,
        })
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/customer", post(cart::customer))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/categories/{slug}", get(categories::show))
        .route("/products/{kind}/{slug}", get(products::show))
        .nest("/cart", cart_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use askama::Template;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::middleware::create_session_layer;

    /// Router backed by a pool that never connects.
    fn test_app() -> Router {
        let config = StorefrontConfig::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/techmart")
            .unwrap();
        let session_layer = create_session_layer(&pool, &config);
        routes()
            .layer(session_layer)
            .with_state(AppState::new(config, pool))
    }

    async fn get_status(uri: &str) -> StatusCode {
        test_app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_unknown_product_kind_is_not_found() {
        assert_eq!(
            get_status("/products/tablet/ipad-air").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_malformed_slugs_are_not_found() {
        assert_eq!(
            get_status("/products/notebook/Not%20A%20Slug").await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status("/categories/UPPER_case").await,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_cart_count_fragment_hides_zero() {
        let empty = cart::CartCountTemplate { count: 0 }.render().unwrap();
        assert!(!empty.contains("badge"));

        let full = cart::CartCountTemplate { count: 3 }.render().unwrap();
        assert!(full.contains(r#"<span class="badge">3</span>"#));
    }

    #[test]
    fn test_cart_items_fragment_renders_empty_cart() {
        let html = cart::CartItemsTemplate {
            cart: crate::models::views::CartView::empty(),
        }
        .render()
        .unwrap();
        assert!(html.contains("Your cart is empty."));
    }
}
