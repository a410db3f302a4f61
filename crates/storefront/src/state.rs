//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::content::ContentStore;
use crate::db::{PgStore, Store};
use crate::services::{
    CarouselService, CatalogCache, CategoryService, FeedbackService, IdentityClient,
    ProductService, ProfileService, StorageClient,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store, hosted API clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    store: Arc<dyn Store>,
    cache: CatalogCache,
    identity: IdentityClient,
    storage: StorageClient,
    content: ContentStore,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, content: ContentStore) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self::with_store(config, pool, store, content)
    }

    /// Create application state with an explicit store implementation.
    ///
    /// The pool is only used by the readiness check and the session store.
    #[must_use]
    pub fn with_store(
        config: StorefrontConfig,
        pool: PgPool,
        store: Arc<dyn Store>,
        content: ContentStore,
    ) -> Self {
        let cache = CatalogCache::new(config.catalog_cache_ttl);
        let identity = IdentityClient::new(&config.backend);
        let storage = StorageClient::new(&config.backend);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                store,
                cache,
                identity,
                storage,
                content,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn store(&self) -> &(dyn Store + 'static) {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    #[must_use]
    pub fn storage(&self) -> &StorageClient {
        &self.inner.storage
    }

    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    // =========================================================================
    // Services
    // =========================================================================

    #[must_use]
    pub fn products(&self) -> ProductService<'_, dyn Store> {
        ProductService::new(self.store(), Some(&self.inner.cache))
    }

    #[must_use]
    pub fn categories(&self) -> CategoryService<'_, dyn Store> {
        CategoryService::new(self.store(), Some(&self.inner.cache))
    }

    #[must_use]
    pub fn carousel(&self) -> CarouselService<'_, dyn Store> {
        CarouselService::new(self.store(), Some(&self.inner.cache))
    }

    #[must_use]
    pub fn profiles(&self) -> ProfileService<'_, dyn Store> {
        ProfileService::new(self.store(), self.inner.config.profile_fetch_timeout)
    }

    #[must_use]
    pub fn feedback(&self) -> FeedbackService<'_, dyn Store> {
        FeedbackService::new(self.store())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::content::tests::sample_store;
    use crate::db::fake::FakeStore;

    /// State over a fake store. The pool never connects.
    pub(crate) fn test_state(store: Arc<FakeStore>) -> AppState {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/apothecary_test")
            .unwrap();
        AppState::with_store(test_config(), pool, store, sample_store())
    }
}
