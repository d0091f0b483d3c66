//! Session-backed models for admin.

pub mod session;

pub use session::{Flash, FlashLevel};
