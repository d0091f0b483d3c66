//! `tm-cli` subcommands.

pub mod customer;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Read a database URL from `primary`, falling back to `DATABASE_URL`.
pub(crate) fn database_url(primary: &'static str) -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var(primary)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
