//! Catalog services: products, categories and carousel slides.

use std::collections::HashMap;

use apothecary_core::{CategoryId, ProductId, SlideId};
use tracing::instrument;

use super::{CatalogCache, OrLog};
use crate::db::{CarouselStore, CategoryStore, ProductStore};
use crate::models::{
    CarouselSlide, Category, CategoryInput, MoveDirection, Product, ProductInput, ProductQuery,
    SlideInput,
};

/// Product reads for the storefront and product CRUD for `/admin`.
pub struct ProductService<'a, S: ?Sized> {
    store: &'a S,
    cache: Option<&'a CatalogCache>,
}

impl<'a, S: ProductStore + ?Sized> ProductService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, cache: Option<&'a CatalogCache>) -> Self {
        Self { store, cache }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: &ProductQuery) -> Vec<Product> {
        self.store
            .list_products(query)
            .await
            .or_log("product", "list")
            .unwrap_or_default()
    }

    pub async fn count(&self, query: &ProductQuery) -> i64 {
        self.store
            .count_products(query)
            .await
            .or_log("product", "count")
            .unwrap_or_default()
    }

    /// Featured products for the home page.
    pub async fn featured(&self, limit: i64) -> Vec<Product> {
        if let Some(cache) = self.cache
            && let Some(cached) = cache.featured(limit).await
        {
            return cached.as_ref().clone();
        }

        let Some(products) = self
            .store
            .featured_products(limit)
            .await
            .or_log("product", "featured")
        else {
            return Vec::new();
        };

        if let Some(cache) = self.cache {
            cache.put_featured(limit, products.clone()).await;
        }
        products
    }

    /// Products in the order `ids` lists them; unknown ids are skipped.
    pub async fn by_ids(&self, ids: &[ProductId]) -> Vec<Product> {
        if ids.is_empty() {
            return Vec::new();
        }
        let Some(products) = self
            .store
            .products_by_ids(ids)
            .await
            .or_log("product", "by_ids")
        else {
            return Vec::new();
        };

        let mut by_id: HashMap<ProductId, Product> =
            products.into_iter().map(|p| (p.id, p)).collect();
        ids.iter().filter_map(|id| by_id.remove(id)).collect()
    }

    pub async fn get(&self, id: ProductId) -> Option<Product> {
        self.store
            .get_product(id)
            .await
            .or_log("product", "get")
            .flatten()
    }

    pub async fn by_slug(&self, slug: &str) -> Option<Product> {
        self.store
            .get_product_by_slug(slug)
            .await
            .or_log("product", "get_by_slug")
            .flatten()
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &ProductInput) -> Option<Product> {
        if let Some(reason) = input.validation_error() {
            tracing::warn!(reason, "Rejected product");
            return None;
        }
        let product = self
            .store
            .create_product(input)
            .await
            .or_log("product", "create")?;
        self.invalidate().await;
        Some(product)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Option<Product> {
        if let Some(reason) = input.validation_error() {
            tracing::warn!(reason, "Rejected product update");
            return None;
        }
        let product = self
            .store
            .update_product(id, input)
            .await
            .or_log("product", "update")?;
        self.invalidate().await;
        Some(product)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> bool {
        let deleted = self
            .store
            .delete_product(id)
            .await
            .or_log("product", "delete")
            .unwrap_or(false);
        if deleted {
            self.invalidate().await;
        }
        deleted
    }

    async fn invalidate(&self) {
        if let Some(cache) = self.cache {
            cache.invalidate_all().await;
        }
    }
}

/// Category reads and CRUD.
pub struct CategoryService<'a, S: ?Sized> {
    store: &'a S,
    cache: Option<&'a CatalogCache>,
}

impl<'a, S: CategoryStore + ?Sized> CategoryService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, cache: Option<&'a CatalogCache>) -> Self {
        Self { store, cache }
    }

    /// All categories ordered by name.
    pub async fn list(&self) -> Vec<Category> {
        if let Some(cache) = self.cache
            && let Some(cached) = cache.categories().await
        {
            return cached.as_ref().clone();
        }

        let Some(categories) = self
            .store
            .list_categories()
            .await
            .or_log("category", "list")
        else {
            return Vec::new();
        };

        if let Some(cache) = self.cache {
            cache.put_categories(categories.clone()).await;
        }
        categories
    }

    pub async fn get(&self, id: CategoryId) -> Option<Category> {
        self.store
            .get_category(id)
            .await
            .or_log("category", "get")
            .flatten()
    }

    pub async fn by_slug(&self, slug: &str) -> Option<Category> {
        self.store
            .get_category_by_slug(slug)
            .await
            .or_log("category", "get_by_slug")
            .flatten()
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &CategoryInput) -> Option<Category> {
        if input.name.trim().is_empty() {
            tracing::warn!("Rejected category without a name");
            return None;
        }
        let category = self
            .store
            .create_category(input)
            .await
            .or_log("category", "create")?;
        self.invalidate().await;
        Some(category)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn update(&self, id: CategoryId, input: &CategoryInput) -> Option<Category> {
        if input.name.trim().is_empty() {
            tracing::warn!("Rejected category without a name");
            return None;
        }
        let category = self
            .store
            .update_category(id, input)
            .await
            .or_log("category", "update")?;
        self.invalidate().await;
        Some(category)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> bool {
        let deleted = self
            .store
            .delete_category(id)
            .await
            .or_log("category", "delete")
            .unwrap_or(false);
        if deleted {
            self.invalidate().await;
        }
        deleted
    }

    async fn invalidate(&self) {
        if let Some(cache) = self.cache {
            cache.invalidate_all().await;
        }
    }
}

/// Home page carousel.
pub struct CarouselService<'a, S: ?Sized> {
    store: &'a S,
    cache: Option<&'a CatalogCache>,
}

impl<'a, S: CarouselStore + ?Sized> CarouselService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, cache: Option<&'a CatalogCache>) -> Self {
        Self { store, cache }
    }

    /// Slides shown on the home page, in display order.
    pub async fn active(&self) -> Vec<CarouselSlide> {
        if let Some(cache) = self.cache
            && let Some(cached) = cache.active_slides().await
        {
            return cached.as_ref().clone();
        }

        let Some(slides) = self
            .store
            .list_active_slides()
            .await
            .or_log("carousel_slide", "list_active")
        else {
            return Vec::new();
        };

        if let Some(cache) = self.cache {
            cache.put_active_slides(slides.clone()).await;
        }
        slides
    }

    pub async fn list(&self) -> Vec<CarouselSlide> {
        self.store
            .list_slides()
            .await
            .or_log("carousel_slide", "list")
            .unwrap_or_default()
    }

    pub async fn get(&self, id: SlideId) -> Option<CarouselSlide> {
        self.store
            .get_slide(id)
            .await
            .or_log("carousel_slide", "get")
            .flatten()
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: &SlideInput) -> Option<CarouselSlide> {
        if let Some(reason) = slide_error(input) {
            tracing::warn!(reason, "Rejected slide");
            return None;
        }
        let slide = self
            .store
            .create_slide(input)
            .await
            .or_log("carousel_slide", "create")?;
        self.invalidate().await;
        Some(slide)
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn update(&self, id: SlideId, input: &SlideInput) -> Option<CarouselSlide> {
        if let Some(reason) = slide_error(input) {
            tracing::warn!(reason, "Rejected slide update");
            return None;
        }
        let slide = self
            .store
            .update_slide(id, input)
            .await
            .or_log("carousel_slide", "update")?;
        self.invalidate().await;
        Some(slide)
    }

    pub async fn set_active(&self, id: SlideId, active: bool) -> bool {
        self.changed(
            self.store
                .set_slide_active(id, active)
                .await
                .or_log("carousel_slide", "set_active"),
        )
        .await
    }

    pub async fn move_slide(&self, id: SlideId, direction: MoveDirection) -> bool {
        self.changed(
            self.store
                .move_slide(id, direction)
                .await
                .or_log("carousel_slide", "move"),
        )
        .await
    }

    pub async fn delete(&self, id: SlideId) -> bool {
        self.changed(
            self.store
                .delete_slide(id)
                .await
                .or_log("carousel_slide", "delete"),
        )
        .await
    }

    async fn changed(&self, result: Option<bool>) -> bool {
        let changed = result.unwrap_or(false);
        if changed && let Some(cache) = self.cache {
            cache.invalidate_all().await;
        }
        changed
    }

    async fn invalidate(&self) {
        if let Some(cache) = self.cache {
            cache.invalidate_all().await;
        }
    }
}

fn slide_error(input: &SlideInput) -> Option<&'static str> {
    if input.title.trim().is_empty() {
        return Some("title is required");
    }
    if input.image_url.trim().is_empty() {
        return Some("image is required");
    }
    None
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::fake::FakeStore;
    use crate::models::catalog::fixtures::{dec, product, product_input};

    fn slide_input(title: &str) -> SlideInput {
        SlideInput {
            title: title.to_string(),
            subtitle: None,
            image_url: "https://cdn.example.test/slide.jpg".to_string(),
            link_url: Some("/shop".to_string()),
            button_text: Some("Shop now".to_string()),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_product_reads_return_data_on_success() {
        let store = FakeStore::default();
        store.insert_product(product(1, "Vitamin C", dec("12.00"))).await;
        store.insert_product(product(2, "Zinc", dec("5.00"))).await;
        let service = ProductService::new(&store, None);

        assert_eq!(service.list(&ProductQuery::default()).await.len(), 2);
        assert_eq!(service.count(&ProductQuery::default()).await, 2);
        assert_eq!(
            service.by_slug("zinc").await.map(|p| p.id),
            Some(ProductId::new(2))
        );
    }

    #[tokio::test]
    async fn test_product_reads_degrade_on_backend_error() {
        let store = FakeStore::failing();
        let service = ProductService::new(&store, None);

        assert!(service.list(&ProductQuery::default()).await.is_empty());
        assert_eq!(service.count(&ProductQuery::default()).await, 0);
        assert!(service.featured(4).await.is_empty());
        assert!(service.get(ProductId::new(1)).await.is_none());
        assert!(service.by_slug("zinc").await.is_none());
        assert!(service.by_ids(&[ProductId::new(1)]).await.is_empty());
    }

    #[tokio::test]
    async fn test_product_writes_degrade_on_backend_error() {
        let store = FakeStore::failing();
        let service = ProductService::new(&store, None);

        assert!(service.create(&product_input("Aspirin", dec("3.00"))).await.is_none());
        assert!(
            service
                .update(ProductId::new(1), &product_input("Aspirin", dec("3.00")))
                .await
                .is_none()
        );
        assert!(!service.delete(ProductId::new(1)).await);
    }

    #[tokio::test]
    async fn test_invalid_product_never_reaches_store() {
        let store = FakeStore::default();
        let service = ProductService::new(&store, None);

        assert!(service.create(&product_input(" ", dec("3.00"))).await.is_none());
        assert!(service.create(&product_input("Aspirin", dec("-3"))).await.is_none());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_by_ids_keeps_requested_order() {
        let store = FakeStore::default();
        for (id, name) in [(1, "Alpha"), (2, "Beta"), (3, "Gamma")] {
            store.insert_product(product(id, name, dec("1.00"))).await;
        }
        let service = ProductService::new(&store, None);

        let ids = [ProductId::new(3), ProductId::new(99), ProductId::new(1)];
        let names: Vec<String> = service.by_ids(&ids).await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Gamma", "Alpha"]);
    }

    #[tokio::test]
    async fn test_featured_served_from_cache_until_write() {
        let store = FakeStore::default();
        let mut featured = product(1, "Vitamin D", dec("8.00"));
        featured.is_featured = true;
        store.insert_product(featured).await;
        let cache = CatalogCache::new(Duration::from_secs(60));
        let service = ProductService::new(&store, Some(&cache));

        assert_eq!(service.featured(4).await.len(), 1);
        let calls = store.call_count();
        assert_eq!(service.featured(4).await.len(), 1);
        assert_eq!(store.call_count(), calls);

        let mut input = product_input("Magnesium", dec("6.00"));
        input.is_featured = true;
        assert!(service.create(&input).await.is_some());
        assert_eq!(service.featured(4).await.len(), 2);
    }

    #[tokio::test]
    async fn test_category_crud() {
        let store = FakeStore::default();
        let cache = CatalogCache::new(Duration::from_secs(60));
        let service = CategoryService::new(&store, Some(&cache));
        let input = CategoryInput {
            name: "Cold & Flu".to_string(),
            description: None,
            image_url: None,
        };

        let created = service.create(&input).await;
        assert_eq!(created.as_ref().map(|c| c.slug.as_str()), Some("cold-flu"));
        assert_eq!(service.list().await.len(), 1);

        let id = created.map(|c| c.id).unwrap_or(CategoryId::new(0));
        assert!(service.delete(id).await);
        assert!(service.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_product_slug_only_changes_with_name() {
        let store = FakeStore::default();
        let service = ProductService::new(&store, None);
        let mut input = product_input("+++", dec("6.00"));

        let created = service.create(&input).await;
        let slug = created.as_ref().map(|p| p.slug.clone()).unwrap_or_default();
        assert!(slug.starts_with("product-"), "{slug}");
        let id = created.map_or(ProductId::new(0), |p| p.id);

        input.price = dec("5.50");
        let updated = service.update(id, &input).await;
        assert_eq!(updated.map(|p| p.slug), Some(slug));

        input.name = "Magnesium Citrate".to_string();
        let renamed = service.update(id, &input).await;
        assert_eq!(renamed.map(|p| p.slug), Some("magnesium-citrate".to_string()));
        assert!(service.by_slug("magnesium-citrate").await.is_some());
    }

    #[tokio::test]
    async fn test_category_fallback_slug_is_stable() {
        let store = FakeStore::default();
        let service = CategoryService::new(&store, None);
        let mut input = CategoryInput {
            name: "& / &".to_string(),
            description: None,
            image_url: None,
        };

        let created = service.create(&input).await;
        let slug = created.as_ref().map(|c| c.slug.clone()).unwrap_or_default();
        assert!(slug.starts_with("category-"), "{slug}");
        let id = created.map_or(CategoryId::new(0), |c| c.id);

        input.description = Some("Heart health".to_string());
        let updated = service.update(id, &input).await;
        assert_eq!(updated.map(|c| c.slug), Some(slug.clone()));
        assert!(service.by_slug(&slug).await.is_some());

        input.name = "Heart Health".to_string();
        let renamed = service.update(id, &input).await;
        assert_eq!(renamed.map(|c| c.slug), Some("heart-health".to_string()));
    }

    #[tokio::test]
    async fn test_category_degrades_on_backend_error() {
        let store = FakeStore::failing();
        let service = CategoryService::new(&store, None);
        let input = CategoryInput {
            name: "Skincare".to_string(),
            description: None,
            image_url: None,
        };

        assert!(service.list().await.is_empty());
        assert!(service.by_slug("skincare").await.is_none());
        assert!(service.create(&input).await.is_none());
        assert!(!service.delete(CategoryId::new(1)).await);
    }

    #[tokio::test]
    async fn test_carousel_reorder_and_toggle() {
        let store = FakeStore::default();
        let service = CarouselService::new(&store, None);
        let first = service.create(&slide_input("First")).await.map(|s| s.id);
        let second = service.create(&slide_input("Second")).await.map(|s| s.id);
        let (Some(first), Some(second)) = (first, second) else {
            panic!("slides were not created");
        };

        assert!(service.move_slide(second, MoveDirection::Up).await);
        let titles: Vec<String> = service.list().await.into_iter().map(|s| s.title).collect();
        assert_eq!(titles, ["Second", "First"]);

        assert!(!service.move_slide(second, MoveDirection::Up).await);
        assert!(service.set_active(first, false).await);
        assert_eq!(service.active().await.len(), 1);
    }

    #[tokio::test]
    async fn test_carousel_degrades_on_backend_error() {
        let store = FakeStore::failing();
        let service = CarouselService::new(&store, None);

        assert!(service.active().await.is_empty());
        assert!(service.list().await.is_empty());
        assert!(service.create(&slide_input("Sale")).await.is_none());
        assert!(!service.set_active(SlideId::new(1), true).await);
        assert!(!service.move_slide(SlideId::new(1), MoveDirection::Down).await);
        assert!(!service.delete(SlideId::new(1)).await);
    }

    #[tokio::test]
    async fn test_slide_without_image_is_rejected() {
        let store = FakeStore::default();
        let service = CarouselService::new(&store, None);
        let mut input = slide_input("Sale");
        input.image_url = String::new();

        assert!(service.create(&input).await.is_none());
        assert_eq!(store.call_count(), 0);
    }
}
