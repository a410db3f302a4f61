pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

use apothecary_core::EmailError;
use apothecary_storefront::db::{RepositoryError, create_pool};

/// Errors shared by every command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("Invalid email address {0:?}: {1}")]
    InvalidEmail(String, #[source] EmailError),

    #[error("No profile found for {0}. The user must sign in once first.")]
    UnknownProfile(String),
}

/// Connect to the storefront database named by the environment.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("APOTHECARY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("APOTHECARY_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    Ok(create_pool(&database_url).await?)
}
