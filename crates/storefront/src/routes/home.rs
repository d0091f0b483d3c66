//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use techmart_core::ProductKind;
use techmart_core::catalog::{LATEST_PER_KIND, order_for_home};

use crate::db::ProductRepository;
use crate::error::Result;
use crate::filters;
use crate::models::views::ProductCardView;
use crate::routes::Layout;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCardView>,
}

/// Display the home page.
///
/// Shows the newest products of every kind. When a featured kind is
/// configured, its products come first.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> Result<HomeTemplate> {
    let repo = ProductRepository::new(state.pool());

    let mut products = Vec::new();
    for kind in ProductKind::ALL {
        products.extend(repo.latest(kind, LATEST_PER_KIND).await?);
    }
    let products = order_for_home(products, &ProductKind::ALL, state.config().featured_kind);

    Ok(HomeTemplate {
        layout: Layout::load(&state, &session).await?,
        products: products.iter().map(ProductCardView::from).collect(),
    })
}
