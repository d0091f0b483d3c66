//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use techmart_core::ProductKind;

use crate::db::ModelCounts;
use crate::error::Result;
use crate::filters;
use crate::routes::Page;
use crate::state::AppState;

/// One row of the model index.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub label: &'static str,
    pub url: String,
    pub count: i64,
    /// URL of the "add" form, for editable models.
    pub add_url: Option<String>,
}

impl ModelEntry {
    fn editable(label: &'static str, url: String, count: i64) -> Self {
        Self {
            label,
            add_url: Some(format!("{url}/new")),
            url,
            count,
        }
    }

    fn read_only(label: &'static str, url: &str, count: i64) -> Self {
        Self {
            label,
            url: url.to_owned(),
            count,
            add_url: None,
        }
    }
}

/// Build the model index in display order.
#[must_use]
pub fn model_entries(counts: &ModelCounts) -> Vec<ModelEntry> {
    vec![
        ModelEntry::editable("Categories", "/categories".to_owned(), counts.categories),
        ModelEntry::editable(
            ProductKind::Notebook.plural_label(),
            format!("/products/{}", ProductKind::Notebook),
            counts.notebooks,
        ),
        ModelEntry::editable(
            ProductKind::Smartphone.plural_label(),
            format!("/products/{}", ProductKind::Smartphone),
            counts.smartphones,
        ),
        ModelEntry::read_only("Carts", "/carts", counts.carts),
        ModelEntry::read_only("Cart products", "/carts", counts.cart_products),
        ModelEntry::read_only("Customers", "/customers", counts.customers),
    ]
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: Page,
    pub models: Vec<ModelEntry>,
}

/// Dashboard page handler.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Result<DashboardTemplate> {
    let counts = ModelCounts::load(state.pool()).await?;
    Ok(DashboardTemplate {
        page: Page::load(&session, "/").await,
        models: model_entries(&counts),
    })
}
