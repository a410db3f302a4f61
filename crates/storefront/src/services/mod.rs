//! Service layer between handlers and the store traits.
//!
//! # Services
//!
//! - `catalog` - Products, categories and carousel slides
//! - `profile` - Profiles, addresses, saved items, appointments, orders
//! - `feedback` - Feedback widget submissions
//! - `identity` - Hosted identity provider client
//! - `storage` - Hosted object storage client
//! - `cache` - TTL cache for home page catalog reads
//!
//! Store-backed services never return errors. A failed store call is logged
//! with the entity and operation and the caller gets an empty `Vec`, `None`,
//! `false` or zero, so pages render a fallback state instead of an error page.

pub mod cache;
pub mod catalog;
pub mod feedback;
pub mod identity;
pub mod profile;
pub mod storage;

pub use cache::CatalogCache;
pub use catalog::{CarouselService, CategoryService, ProductService};
pub use feedback::FeedbackService;
pub use identity::{IdentityClient, IdentityError};
pub use profile::ProfileService;
pub use storage::{StorageClient, StorageError};

use crate::db::RepositoryError;

/// Turn a store result into an `Option`, logging the failure.
pub(crate) trait OrLog<T> {
    fn or_log(self, entity: &'static str, operation: &'static str) -> Option<T>;
}

impl<T> OrLog<T> for Result<T, RepositoryError> {
    fn or_log(self, entity: &'static str, operation: &'static str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e @ (RepositoryError::NotFound | RepositoryError::Conflict(_))) => {
                tracing::warn!(entity, operation, error = %e, "store call rejected");
                None
            }
            Err(e) => {
                tracing::error!(entity, operation, error = %e, "store call failed");
                None
            }
        }
    }
}
