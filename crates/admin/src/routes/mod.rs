//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Dashboard
//! GET  /                                - Models with row counts
//!
//! # Categories
//! GET  /categories                      - Category listing
//! GET  /categories/new                  - New category form
//! POST /categories                      - Create category
//! GET  /categories/{id}/edit            - Edit category form
//! POST /categories/{id}                 - Update category
//! POST /categories/{id}/delete          - Delete category and its products
//!
//! # Products (kind = notebook | smartphone, multipart forms)
//! GET  /products/{kind}                 - Product listing
//! GET  /products/{kind}/new             - New product form
//! POST /products/{kind}                 - Create product
//! GET  /products/{kind}/{id}/edit       - Edit product form
//! POST /products/{kind}/{id}            - Update product
//! POST /products/{kind}/{id}/delete     - Delete product
//!
//! # Carts and customers
//! GET  /carts                           - Recent carts
//! GET  /carts/{id}                      - Cart detail
//! POST /carts/{id}/in-order             - Freeze a cart as an order
//! GET  /customers                       - Customer listing
//!
//! # Files
//! GET  /media/*                         - Uploaded product images
//! GET  /static/*                        - Static assets
//! ```

pub mod carts;
pub mod categories;
pub mod customers;
pub mod dashboard;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_sessions::Session;

use techmart_core::media::ImageRules;

use crate::models::Flash;
use crate::models::session::take_flash;
use crate::state::AppState;

/// Largest accepted product form body: the image limit plus room for text
/// fields and multipart framing.
pub const PRODUCT_FORM_LIMIT: usize = ImageRules::PRODUCT.max_bytes + 1024 * 1024;

/// Data every full page needs for the shared layout.
pub struct Page {
    /// Path of the current section, for highlighting the navigation.
    pub current_path: String,
    /// Message left by the previous request.
    pub flash: Option<Flash>,
}

impl Page {
    /// Take the pending flash message and build the layout data.
    pub async fn load(session: &Session, current_path: impl Into<String>) -> Self {
        Self {
            current_path: current_path.into(),
            flash: take_flash(session).await,
        }
    }

    /// Whether the navigation entry for `prefix` is active.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(prefix)
        }
    }
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/new", get(categories::new_form))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit_form))
        .route("/{id}/delete", post(categories::delete))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{kind}", get(products::index).post(products::create))
        .route("/{kind}/new", get(products::new_form))
        .route("/{kind}/{id}", post(products::update))
        .route("/{kind}/{id}/edit", get(products::edit_form))
        .route("/{kind}/{id}/delete", post(products::delete))
        .layer(DefaultBodyLimit::max(PRODUCT_FORM_LIMIT))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .route("/carts", get(carts::index))
        .route("/carts/{id}", get(carts::show))
        .route("/carts/{id}/in-order", post(carts::mark_in_order))
        .route("/customers", get(customers::index))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AdminConfig;
    use crate::middleware::create_session_layer;

    /// Router backed by a pool that never connects.
    fn test_app() -> Router {
        let config = AdminConfig::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/techmart")
            .unwrap();
        let session_layer = create_session_layer(&pool, &config);
        routes()
            .layer(session_layer)
            .with_state(AppState::new(config, pool))
    }

    #[tokio::test]
    async fn test_unknown_product_kind_is_not_found() {
        let response = test_app()
            .oneshot(Request::get("/products/tablet").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_page_active_section() {
        let page = Page {
            current_path: "/products/notebook".to_owned(),
            flash: None,
        };
        assert!(page.is_active("/products/notebook"));
        assert!(!page.is_active("/products/smartphone"));
        assert!(!page.is_active("/"));
    }
}
