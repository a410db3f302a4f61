//! Database access for the storefront `PostgreSQL`.
//!
//! # Schema: `apothecary`
//!
//! ## Tables
//!
//! - `category`, `product`, `carousel_slide` - Catalog, edited in `/admin`
//! - `profile` - One row per identity-provider user
//! - `address`, `saved_item`, `appointment`, `"order"` - Per-user account data
//! - `feedback` - Feedback widget submissions
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Store traits
//!
//! Each entity has an async store trait. [`PgStore`] implements all of them
//! with runtime-checked sqlx queries; services only see the traits, so tests
//! run the same service code against an in-memory store.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p apothecary-cli -- migrate
//! ```

mod accounts;
mod catalog;
#[cfg(test)]
pub mod fake;
mod feedback;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use accounts::{AddressStore, AppointmentStore, OrderStore, ProfileStore, SavedItemStore};
pub use catalog::{CarouselStore, CategoryStore, ProductStore};
pub use feedback::FeedbackStore;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict(message)`, anything else to `Database`.
    pub(crate) fn from_insert(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Every store trait the application needs, implemented by [`PgStore`].
pub trait Store:
    ProductStore
    + CategoryStore
    + CarouselStore
    + ProfileStore
    + AddressStore
    + SavedItemStore
    + AppointmentStore
    + OrderStore
    + FeedbackStore
{
}

impl<T> Store for T where
    T: ProductStore
        + CategoryStore
        + CarouselStore
        + ProfileStore
        + AddressStore
        + SavedItemStore
        + AppointmentStore
        + OrderStore
        + FeedbackStore
{
}

/// `PostgreSQL` implementation of the store traits.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Escape `LIKE` wildcards so user input matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Slug for a new row, or `<prefix>-<8 hex>` when the name has no usable characters.
pub(crate) fn slug_or_fallback(name: &str, prefix: &str) -> String {
    apothecary_core::Slug::from_title(name).map_or_else(
        || {
            let raw = uuid::Uuid::new_v4().simple().to_string();
            format!("{prefix}-{}", raw.chars().take(8).collect::<String>())
        },
        |slug| slug.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50% off_now"), r"50\% off\_now");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("cough syrup"), "cough syrup");
    }

    #[test]
    fn test_slug_or_fallback() {
        assert_eq!(slug_or_fallback("Cold & Flu", "category"), "cold-flu");
        let fallback = slug_or_fallback("!!!", "product");
        assert!(fallback.starts_with("product-"));
        assert_eq!(fallback.len(), "product-".len() + 8);
    }

    #[test]
    fn test_repository_error_display() {
        assert_eq!(RepositoryError::NotFound.to_string(), "not found");
        assert_eq!(
            RepositoryError::Conflict("slug taken".to_string()).to_string(),
            "constraint violation: slug taken"
        );
    }
}
