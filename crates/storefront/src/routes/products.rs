//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tower_sessions::Session;
use tracing::instrument;

use techmart_core::{ProductKind, Slug};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::views::ProductView;
use crate::routes::Layout;
use crate::state::AppState;

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductView,
}

/// Display a product with its specification table.
///
/// Unknown kinds and slugs are both reported as not found.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path((kind, slug)): Path<(String, String)>,
) -> Result<ProductShowTemplate> {
    let not_found = || AppError::NotFound(format!("product {kind}/{slug}"));

    let kind = kind.parse::<ProductKind>().map_err(|_| not_found())?;
    let slug = Slug::parse(&slug).map_err(|_| not_found())?;
    let product = ProductRepository::new(state.pool())
        .get_by_slug(kind, &slug)
        .await?
        .ok_or_else(not_found)?;

    Ok(ProductShowTemplate {
        layout: Layout::load(&state, &session).await?,
        product: ProductView::from(&product),
    })
}
