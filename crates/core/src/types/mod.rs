//! Core types for TechMart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod kind;
pub mod phone;
pub mod price;
pub mod slug;

pub use email::{Email, EmailError};
pub use id::*;
pub use kind::{ProductKind, ProductRef, UnknownProductKind};
pub use phone::{PhoneError, PhoneNumber};
pub use price::{Price, PriceError, format_money};
pub use slug::{Slug, SlugError, slugify};
