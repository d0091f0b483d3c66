//! TechMart Core - Shared domain library.
//!
//! This crate provides the types used across all TechMart components:
//! - `storefront` - Public catalog and cart site
//! - `admin` - Internal catalog management panel
//! - `cli` - Command-line tools for migrations, seeding and management
//!
//! # Architecture
//!
//! The core crate contains only types, validation and pure business rules -
//! no database access, no HTTP clients, no filesystem access. This keeps it
//! lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, slugs, prices, emails and phones
//! - [`catalog`] - Categories, notebooks, smartphones and specification tables
//! - [`cart`] - Carts, cart lines and total arithmetic
//! - [`customer`] - Customers and customer input validation
//! - [`media`] - Product image rules (byte size and pixel bounds)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod media;
pub mod types;

pub use types::*;
