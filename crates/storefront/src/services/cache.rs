//! Cache for catalog reads shown on every home page view.
//!
//! Categories, active carousel slides and featured products change only
//! through `/admin`, so they are cached with a TTL and invalidated wholesale
//! by any admin write.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::models::{CarouselSlide, Category, Product};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    ActiveSlides,
    Featured { limit: i64 },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Slides(Arc<Vec<CarouselSlide>>),
    Products(Arc<Vec<Product>>),
}

/// TTL cache shared by all catalog services.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(64).time_to_live(ttl).build(),
        }
    }

    pub async fn categories(&self) -> Option<Arc<Vec<Category>>> {
        match self.cache.get(&CacheKey::Categories).await {
            Some(CacheValue::Categories(categories)) => Some(categories),
            _ => None,
        }
    }

    pub async fn put_categories(&self, categories: Vec<Category>) {
        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::new(categories)),
            )
            .await;
    }

    pub async fn active_slides(&self) -> Option<Arc<Vec<CarouselSlide>>> {
        match self.cache.get(&CacheKey::ActiveSlides).await {
            Some(CacheValue::Slides(slides)) => Some(slides),
            _ => None,
        }
    }

    pub async fn put_active_slides(&self, slides: Vec<CarouselSlide>) {
        self.cache
            .insert(CacheKey::ActiveSlides, CacheValue::Slides(Arc::new(slides)))
            .await;
    }

    pub async fn featured(&self, limit: i64) -> Option<Arc<Vec<Product>>> {
        match self.cache.get(&CacheKey::Featured { limit }).await {
            Some(CacheValue::Products(products)) => Some(products),
            _ => None,
        }
    }

    pub async fn put_featured(&self, limit: i64, products: Vec<Product>) {
        self.cache
            .insert(
                CacheKey::Featured { limit },
                CacheValue::Products(Arc::new(products)),
            )
            .await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
