//! Session-related types.
//!
//! The session remembers which cart the visitor is filling and, once they
//! have given their details, which customer they are.

use tower_sessions::Session;

use techmart_core::{CartId, CustomerId};

/// Session keys for storefront state.
pub mod keys {
    /// Key for the visitor's current cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for the customer the visitor identified as.
    pub const CUSTOMER_ID: &str = "customer_id";
}

/// Get the cart ID from the session.
pub async fn cart_id(session: &Session) -> Option<CartId> {
    session.get::<CartId>(keys::CART_ID).await.ok().flatten()
}

/// Remember the cart ID in the session.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn set_cart_id(
    session: &Session,
    cart_id: CartId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART_ID, cart_id).await
}

/// Get the customer ID from the session.
pub async fn customer_id(session: &Session) -> Option<CustomerId> {
    session
        .get::<CustomerId>(keys::CUSTOMER_ID)
        .await
        .ok()
        .flatten()
}

/// Remember the customer ID in the session.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn set_customer_id(
    session: &Session,
    customer_id: CustomerId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CUSTOMER_ID, customer_id).await
}
