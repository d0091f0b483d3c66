//! TechMart CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! tm-cli migrate storefront
//!
//! # Run admin database migrations
//! tm-cli migrate admin
//!
//! # Run all database migrations
//! tm-cli migrate all
//!
//! # Load categories and products from YAML
//! tm-cli seed catalog catalog.yaml --media-dir seed-images
//!
//! # Create a customer
//! tm-cli customer create -e jane@example.com -f Jane -l Doe -p "+1 555 0100" -a "1 Main St"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed catalog` - Upsert the catalog from a YAML file
//! - `customer create` - Create customers

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tm-cli")]
#[command(author, version, about = "TechMart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage customers
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run storefront database migrations
    Storefront,
    /// Run admin database migrations
    Admin,
    /// Run all database migrations
    All,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert categories and products from a YAML file
    Catalog {
        /// Path to the catalog YAML file
        file: PathBuf,

        /// Directory image paths are relative to (defaults to the file's directory)
        #[arg(long)]
        media_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CustomerAction {
    /// Create a new customer
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Phone number
        #[arg(short, long)]
        phone: String,

        /// Postal address
        #[arg(short, long)]
        address: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file, media_dir } => {
                commands::seed::catalog(&file, media_dir.as_deref()).await?;
            }
        },
        Commands::Customer { action } => match action {
            CustomerAction::Create {
                email,
                first_name,
                last_name,
                phone,
                address,
            } => {
                commands::customer::create(&email, &first_name, &last_name, &phone, &address)
                    .await?;
            }
        },
    }
    Ok(())
}
