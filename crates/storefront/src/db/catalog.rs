//! Catalog stores: products, categories and carousel slides.

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use apothecary_core::{CategoryId, ProductId, SlideId};

use super::{PgStore, RepositoryError, escape_like, slug_or_fallback};
use crate::models::{
    CarouselSlide, Category, CategoryInput, MoveDirection, Product, ProductInput, ProductQuery,
    SlideInput,
};

const PRODUCT_COLUMNS: &str = "id, category_id, name, slug, description, price, sale_price, \
     image_url, stock, is_featured, requires_prescription, payment_link, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, slug, description, image_url, created_at";

const SLIDE_COLUMNS: &str =
    "id, title, subtitle, image_url, link_url, button_text, position, is_active, created_at";

/// Product persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products matching `query`, sorted and paged.
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError>;

    /// Number of products matching `query`'s filters (paging ignored).
    async fn count_products(&self, query: &ProductQuery) -> Result<i64, RepositoryError>;

    /// Featured products, newest first.
    async fn featured_products(&self, limit: i64) -> Result<Vec<Product>, RepositoryError>;

    /// Products with the given ids, in no particular order.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError>;

    /// Insert a product; the slug is derived from its name.
    ///
    /// # Errors
    ///
    /// `Conflict` when the derived slug is taken.
    async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError>;

    /// Replace a product's fields. The slug is only rebuilt when the name
    /// changes.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Conflict` when the new slug is taken.
    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError>;

    /// Returns `true` when a row was deleted.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

/// Category persistence.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    async fn get_category_by_slug(&self, slug: &str)
    -> Result<Option<Category>, RepositoryError>;

    async fn create_category(&self, input: &CategoryInput) -> Result<Category, RepositoryError>;

    /// The slug is only rebuilt when the name changes.
    async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError>;

    /// Products in a deleted category become uncategorised.
    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError>;
}

/// Carousel slide persistence.
#[async_trait]
pub trait CarouselStore: Send + Sync {
    /// Active slides in display order.
    async fn list_active_slides(&self) -> Result<Vec<CarouselSlide>, RepositoryError>;

    /// Every slide in display order.
    async fn list_slides(&self) -> Result<Vec<CarouselSlide>, RepositoryError>;

    async fn get_slide(&self, id: SlideId) -> Result<Option<CarouselSlide>, RepositoryError>;

    /// Insert a slide at the end of the display order.
    async fn create_slide(&self, input: &SlideInput) -> Result<CarouselSlide, RepositoryError>;

    async fn update_slide(
        &self,
        id: SlideId,
        input: &SlideInput,
    ) -> Result<CarouselSlide, RepositoryError>;

    /// Returns `true` when the slide exists.
    async fn set_slide_active(&self, id: SlideId, active: bool) -> Result<bool, RepositoryError>;

    /// Swap a slide with its neighbour. Returns `false` when it is already at
    /// that end of the list or does not exist.
    async fn move_slide(&self, id: SlideId, direction: MoveDirection)
    -> Result<bool, RepositoryError>;

    async fn delete_slide(&self, id: SlideId) -> Result<bool, RepositoryError>;
}

fn push_product_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    builder.push(" WHERE TRUE");
    if let Some(category_id) = query.category_id {
        builder.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(term) = query.search_term() {
        let pattern = format!("%{}%", escape_like(term));
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM apothecary.product"
        ));
        push_product_filters(&mut builder, query);
        builder
            .push(" ORDER BY ")
            .push(query.sort.order_by())
            .push(" LIMIT ")
            .push_bind(query.limit.max(0))
            .push(" OFFSET ")
            .push_bind(query.offset.max(0));

        let products = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn count_products(&self, query: &ProductQuery) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM apothecary.product");
        push_product_filters(&mut builder, query);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn featured_products(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM apothecary.product \
             WHERE is_featured ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM apothecary.product WHERE id = ANY($1)"
        ))
        .bind(raw)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM apothecary.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM apothecary.product WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO apothecary.product \
                 (category_id, name, slug, description, price, sale_price, image_url, stock, \
                  is_featured, requires_prescription, payment_link) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(input.category_id)
        .bind(input.name.trim())
        .bind(slug_or_fallback(&input.name, "product"))
        .bind(&input.description)
        .bind(input.price)
        .bind(input.sale_price)
        .bind(&input.image_url)
        .bind(input.stock)
        .bind(input.is_featured)
        .bind(input.requires_prescription)
        .bind(&input.payment_link)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "a product with this name already exists"))
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE apothecary.product SET \
                 category_id = $2, name = $3, \
                 slug = CASE WHEN name = $3 THEN slug ELSE $4 END, \
                 description = $5, price = $6, \
                 sale_price = $7, image_url = $8, stock = $9, is_featured = $10, \
                 requires_prescription = $11, payment_link = $12, updated_at = now() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(input.category_id)
        .bind(input.name.trim())
        .bind(slug_or_fallback(&input.name, "product"))
        .bind(&input.description)
        .bind(input.price)
        .bind(input.sale_price)
        .bind(&input.image_url)
        .bind(input.stock)
        .bind(input.is_featured)
        .bind(input.requires_prescription)
        .bind(&input.payment_link)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "a product with this name already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM apothecary.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM apothecary.category ORDER BY name, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM apothecary.category WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM apothecary.category WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn create_category(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO apothecary.category (name, slug, description, image_url) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(input.name.trim())
        .bind(slug_or_fallback(&input.name, "category"))
        .bind(&input.description)
        .bind(&input.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "a category with this name already exists"))
    }

    async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(&format!(
            "UPDATE apothecary.category \
             SET name = $2, slug = CASE WHEN name = $2 THEN slug ELSE $3 END, \
                 description = $4, image_url = $5 \
             WHERE id = $1 \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(slug_or_fallback(&input.name, "category"))
        .bind(&input.description)
        .bind(&input.image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "a category with this name already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM apothecary.category WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CarouselStore for PgStore {
    async fn list_active_slides(&self) -> Result<Vec<CarouselSlide>, RepositoryError> {
        let slides = sqlx::query_as::<_, CarouselSlide>(&format!(
            "SELECT {SLIDE_COLUMNS} FROM apothecary.carousel_slide \
             WHERE is_active ORDER BY position, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(slides)
    }

    async fn list_slides(&self) -> Result<Vec<CarouselSlide>, RepositoryError> {
        let slides = sqlx::query_as::<_, CarouselSlide>(&format!(
            "SELECT {SLIDE_COLUMNS} FROM apothecary.carousel_slide ORDER BY position, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(slides)
    }

    async fn get_slide(&self, id: SlideId) -> Result<Option<CarouselSlide>, RepositoryError> {
        let slide = sqlx::query_as::<_, CarouselSlide>(&format!(
            "SELECT {SLIDE_COLUMNS} FROM apothecary.carousel_slide WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(slide)
    }

    async fn create_slide(&self, input: &SlideInput) -> Result<CarouselSlide, RepositoryError> {
        let slide = sqlx::query_as::<_, CarouselSlide>(&format!(
            "INSERT INTO apothecary.carousel_slide \
                 (title, subtitle, image_url, link_url, button_text, is_active, position) \
             VALUES ($1, $2, $3, $4, $5, $6, \
                 (SELECT COALESCE(MAX(position), 0) + 1 FROM apothecary.carousel_slide)) \
             RETURNING {SLIDE_COLUMNS}"
        ))
        .bind(input.title.trim())
        .bind(&input.subtitle)
        .bind(&input.image_url)
        .bind(&input.link_url)
        .bind(&input.button_text)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(slide)
    }

    async fn update_slide(
        &self,
        id: SlideId,
        input: &SlideInput,
    ) -> Result<CarouselSlide, RepositoryError> {
        sqlx::query_as::<_, CarouselSlide>(&format!(
            "UPDATE apothecary.carousel_slide \
             SET title = $2, subtitle = $3, image_url = $4, link_url = $5, \
                 button_text = $6, is_active = $7 \
             WHERE id = $1 \
             RETURNING {SLIDE_COLUMNS}"
        ))
        .bind(id)
        .bind(input.title.trim())
        .bind(&input.subtitle)
        .bind(&input.image_url)
        .bind(&input.link_url)
        .bind(&input.button_text)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn set_slide_active(&self, id: SlideId, active: bool) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE apothecary.carousel_slide SET is_active = $2 WHERE id = $1")
                .bind(id)
                .bind(active)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn move_slide(
        &self,
        id: SlideId,
        direction: MoveDirection,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let Some(position) = sqlx::query_scalar::<_, i32>(
            "SELECT position FROM apothecary.carousel_slide WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(false);
        };

        let neighbour_sql = match direction {
            MoveDirection::Up => {
                "SELECT id, position FROM apothecary.carousel_slide \
                 WHERE (position, id) < ($1, $2) ORDER BY position DESC, id DESC LIMIT 1 FOR UPDATE"
            }
            MoveDirection::Down => {
                "SELECT id, position FROM apothecary.carousel_slide \
                 WHERE (position, id) > ($1, $2) ORDER BY position, id LIMIT 1 FOR UPDATE"
            }
        };
        let Some((neighbour_id, neighbour_position)) =
            sqlx::query_as::<_, (SlideId, i32)>(neighbour_sql)
                .bind(position)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(false);
        };

        let (new_position, new_neighbour_position) =
            swapped_positions(position, neighbour_position, direction);

        sqlx::query("UPDATE apothecary.carousel_slide SET position = $2 WHERE id = $1")
            .bind(id)
            .bind(new_position)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE apothecary.carousel_slide SET position = $2 WHERE id = $1")
            .bind(neighbour_id)
            .bind(new_neighbour_position)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_slide(&self, id: SlideId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM apothecary.carousel_slide WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// New `(moved, neighbour)` positions after a swap. Tied positions are split
/// so the moved slide still ends up on the requested side.
pub(crate) const fn swapped_positions(
    position: i32,
    neighbour: i32,
    direction: MoveDirection,
) -> (i32, i32) {
    if position != neighbour {
        return (neighbour, position);
    }
    match direction {
        MoveDirection::Up => (neighbour - 1, position),
        MoveDirection::Down => (neighbour + 1, position),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swapped_positions_distinct() {
        assert_eq!(swapped_positions(3, 2, MoveDirection::Up), (2, 3));
        assert_eq!(swapped_positions(3, 5, MoveDirection::Down), (5, 3));
    }

    #[test]
    fn test_swapped_positions_tied() {
        assert_eq!(swapped_positions(4, 4, MoveDirection::Up), (3, 4));
        assert_eq!(swapped_positions(4, 4, MoveDirection::Down), (5, 4));
    }
}
