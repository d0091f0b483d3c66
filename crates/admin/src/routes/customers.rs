//! Customers list route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use techmart_core::customer::Customer;

use crate::db::CustomerRepository;
use crate::error::Result;
use crate::filters;
use crate::routes::Page;
use crate::state::AppState;

/// Customers list page template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub page: Page,
    pub customers: Vec<Customer>,
}

/// Customers list page handler.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> Result<CustomersIndexTemplate> {
    let customers = CustomerRepository::new(state.pool()).list().await?;
    Ok(CustomersIndexTemplate {
        page: Page::load(&session, "/customers").await,
        customers,
    })
}
