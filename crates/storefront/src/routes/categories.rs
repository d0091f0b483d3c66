//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tower_sessions::Session;
use tracing::instrument;

use techmart_core::Slug;

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::views::ProductCardView;
use crate::routes::Layout;
use crate::state::AppState;

/// Category detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub layout: Layout,
    pub name: String,
    pub products: Vec<ProductCardView>,
}

/// Display a category with all of its products.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<CategoryShowTemplate> {
    let not_found = || AppError::NotFound(format!("category {slug}"));

    let slug = Slug::parse(&slug).map_err(|_| not_found())?;
    let category = CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(not_found)?;

    let products = ProductRepository::new(state.pool())
        .list_by_category(category.id)
        .await?;

    Ok(CategoryShowTemplate {
        layout: Layout::load(&state, &session).await?,
        name: category.name,
        products: products.iter().map(ProductCardView::from).collect(),
    })
}
