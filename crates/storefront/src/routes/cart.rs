//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart ID is kept in the session; a cart that has been turned into an
//! order is never reused, so the next change starts a fresh cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use techmart_core::cart::{Cart, check_quantity};
use techmart_core::customer::CustomerDetails;
use techmart_core::{CartProductId, ProductKind, Slug};

use crate::db::{CartRepository, CustomerRepository, ProductRepository};
use crate::error::{AppError, Result, add_breadcrumb, set_sentry_user};
use crate::filters;
use crate::models::session;
use crate::models::views::CartView;
use crate::routes::Layout;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub kind: String,
    pub slug: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: i32,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: i32,
}

/// Customer details form data.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub customer: CustomerForm,
    pub customer_error: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: i32,
}

// =============================================================================
// Cart Lookup
// =============================================================================

/// The visitor's cart, if they have one that can still be changed.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded.
pub async fn open_cart(state: &AppState, session: &Session) -> Result<Option<Cart>> {
    let Some(cart_id) = session::cart_id(session).await else {
        return Ok(None);
    };
    let cart = CartRepository::new(state.pool()).get(cart_id).await?;
    Ok(cart.filter(Cart::is_open))
}

/// The visitor's open cart, creating one if needed.
///
/// A new cart belongs to the customer the session knows about, or is
/// anonymous otherwise.
async fn get_or_create_cart(state: &AppState, session: &Session) -> Result<Cart> {
    if let Some(cart) = open_cart(state, session).await? {
        return Ok(cart);
    }

    let owner = session::customer_id(session).await;
    let cart = CartRepository::new(state.pool()).create(owner).await?;
    session::set_cart_id(session, cart.id).await?;
    tracing::info!(cart_id = %cart.id, anonymous = cart.for_anonymous_user, "Created cart");
    Ok(cart)
}

/// Load the view of the visitor's cart.
async fn cart_view(state: &AppState, session: &Session) -> Result<CartView> {
    let Some(cart) = open_cart(state, session).await? else {
        return Ok(CartView::empty());
    };
    let lines = CartRepository::new(state.pool()).lines(cart.id).await?;
    Ok(CartView::new(&cart, &lines))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartShowTemplate> {
    Ok(CartShowTemplate {
        layout: Layout::load(&state, &session).await?,
        cart: cart_view(&state, &session).await?,
        customer: CustomerForm::default(),
        customer_error: None,
    })
}

/// Cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<CartCountTemplate> {
    let count = open_cart(&state, &session)
        .await?
        .map_or(0, |cart| cart.total_products);
    Ok(CartCountTemplate { count })
}

/// Add a product to the cart (HTMX).
///
/// Creates the cart if the visitor has none. Adding a product that is already
/// in the cart increases its quantity. Returns the new count badge and an
/// HTMX trigger so other elements can refresh.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = check_quantity(form.quantity.unwrap_or(1))
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let not_found = || AppError::NotFound(format!("product {}/{}", form.kind, form.slug));
    let kind = form.kind.parse::<ProductKind>().map_err(|_| not_found())?;
    let slug = Slug::parse(&form.slug).map_err(|_| not_found())?;

    let product = ProductRepository::new(state.pool())
        .get_by_slug(kind, &slug)
        .await?
        .ok_or_else(not_found)?;

    let cart = get_or_create_cart(&state, &session).await?;
    let cart = CartRepository::new(state.pool())
        .add_product(cart.id, product.product_ref(), quantity)
        .await?;

    let label = format!("{kind}/{slug}");
    add_breadcrumb("cart", "Added to cart", Some(&[("product", label.as_str())]));

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.total_products,
        },
    )
        .into_response())
}

/// Update a cart line's quantity (HTMX). Zero removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    if form.quantity > 0 {
        check_quantity(form.quantity).map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    let Some(cart) = open_cart(&state, &session).await? else {
        return Ok(CartItemsTemplate {
            cart: CartView::empty(),
        }
        .into_response());
    };

    CartRepository::new(state.pool())
        .set_quantity(cart.id, CartProductId::new(form.line_id), form.quantity)
        .await?;

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: cart_view(&state, &session).await?,
        },
    )
        .into_response())
}

/// Remove a line from the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let Some(cart) = open_cart(&state, &session).await? else {
        return Ok(CartItemsTemplate {
            cart: CartView::empty(),
        }
        .into_response());
    };

    CartRepository::new(state.pool())
        .remove_line(cart.id, CartProductId::new(form.line_id))
        .await?;

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: cart_view(&state, &session).await?,
        },
    )
        .into_response())
}

/// Record the customer's details and hand the cart over to them.
///
/// The customer is looked up by email and created or updated. Invalid input
/// re-renders the cart page with the error.
#[instrument(skip(state, session, form))]
pub async fn customer(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CustomerForm>,
) -> Result<Response> {
    let details = match CustomerDetails::parse(
        &form.email,
        &form.first_name,
        &form.last_name,
        &form.phone,
        &form.address,
    ) {
        Ok(details) => details,
        Err(e) => {
            let page = CartShowTemplate {
                layout: Layout::load(&state, &session).await?,
                cart: cart_view(&state, &session).await?,
                customer: form,
                customer_error: Some(e.to_string()),
            };
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
    };

    let customer = CustomerRepository::new(state.pool())
        .upsert(&details)
        .await?;
    session::set_customer_id(&session, customer.id).await?;
    set_sentry_user(&customer.id, Some(customer.email.as_str()));

    let cart = get_or_create_cart(&state, &session).await?;
    CartRepository::new(state.pool())
        .attach_customer(cart.id, customer.id)
        .await?;
    tracing::info!(cart_id = %cart.id, customer_id = %customer.id, "Cart attached to customer");

    Ok(Redirect::to("/cart").into_response())
}
