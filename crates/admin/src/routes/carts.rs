//! Cart route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use axum::response::Redirect;
use tower_sessions::Session;
use tracing::instrument;

use techmart_core::CartId;

use crate::db::CartRepository;
use crate::db::carts::{CartLineRow, CartSummary};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::Flash;
use crate::models::session::set_flash;
use crate::routes::Page;
use crate::state::AppState;

/// Number of carts shown on the list page.
const CART_LIST_LIMIT: i64 = 200;

/// Carts list page template.
#[derive(Template, WebTemplate)]
#[template(path = "carts/index.html")]
pub struct CartsIndexTemplate {
    pub page: Page,
    pub carts: Vec<CartSummary>,
}

/// Cart detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "carts/show.html")]
pub struct CartShowTemplate {
    pub page: Page,
    pub cart: CartSummary,
    pub lines: Vec<CartLineRow>,
}

/// Carts list page handler.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Result<CartsIndexTemplate> {
    let carts = CartRepository::new(state.pool())
        .list(CART_LIST_LIMIT)
        .await?;
    Ok(CartsIndexTemplate {
        page: Page::load(&session, "/carts").await,
        carts,
    })
}

/// Cart detail page handler.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<CartShowTemplate> {
    let id = CartId::new(id);
    let repo = CartRepository::new(state.pool());
    let cart = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart {id}")))?;
    let lines = repo.lines(id).await?;

    Ok(CartShowTemplate {
        page: Page::load(&session, "/carts").await,
        cart,
        lines,
    })
}

/// Freeze a cart so the storefront no longer changes it.
#[instrument(skip(state, session))]
pub async fn mark_in_order(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let id = CartId::new(id);
    CartRepository::new(state.pool()).mark_in_order(id).await?;
    set_flash(&session, Flash::success(format!("Cart {id} marked as in order"))).await;
    Ok(Redirect::to(&format!("/carts/{id}")))
}
