//! TechMart Admin library.
//!
//! This crate provides the admin functionality as a library,
//! allowing it to be tested and reused by the CLI.
//!
//! # Security
//!
//! The admin panel writes the catalog and product images directly. It has no
//! login of its own: bind it to localhost and reach it through a private
//! network or an SSH tunnel.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod media;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
