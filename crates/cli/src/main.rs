//! Apothecary CLI - database migrations, demo data and admin access.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! apothecary-cli migrate
//!
//! # Load demo categories, products and carousel slides
//! apothecary-cli seed
//!
//! # Give an existing profile access to /admin
//! apothecary-cli admin grant pharmacist@example.com
//!
//! # Take it away again
//! apothecary-cli admin revoke pharmacist@example.com
//! ```
//!
//! All commands read `APOTHECARY_DATABASE_URL` (or `DATABASE_URL`) from the
//! environment or a `.env` file.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "apothecary-cli")]
#[command(author, version, about = "Apothecary CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load demo catalog data (skips rows that already exist)
    Seed,
    /// Manage admin access
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant admin access to the profile with this email
    Grant {
        /// Email the user signed up with
        email: String,
    },
    /// Revoke admin access from the profile with this email
    Revoke {
        /// Email the user signed up with
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Grant { email } => commands::admin::set_admin(&email, true).await?,
            AdminAction::Revoke { email } => commands::admin::set_admin(&email, false).await?,
        },
    }
    Ok(())
}
