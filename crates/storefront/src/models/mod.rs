//! Storefront view and session models.

pub mod session;
pub mod views;

pub use session::keys as session_keys;
