//! Catalog rows: products, categories and home page carousel slides.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use apothecary_core::{CategoryId, Price, ProductId, SlideId};

/// A product row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub stock: i32,
    pub is_featured: bool,
    pub requires_prescription: bool,
    /// Hosted payment page the checkout button hands off to.
    pub payment_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price the customer pays: the sale price when it undercuts the list price.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        match self.sale_price {
            Some(sale) if sale < self.price => Price::usd(sale),
            _ => Price::usd(self.price),
        }
    }

    /// List price, only when a lower sale price is active.
    #[must_use]
    pub fn compare_at_price(&self) -> Option<Price> {
        self.sale_price
            .filter(|sale| *sale < self.price)
            .map(|_| Price::usd(self.price))
    }

    /// Whole-percent discount for the sale badge.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        self.compare_at_price()
            .and_then(|original| self.effective_price().percent_off(&original))
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether checkout can hand off to a payment page.
    #[must_use]
    pub fn can_checkout(&self) -> bool {
        self.in_stock() && self.payment_link.as_deref().is_some_and(|l| !l.is_empty())
    }
}

/// Product listing sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    pub const ALL: [Self; 4] = [Self::Newest, Self::PriceAsc, Self::PriceDesc, Self::Name];

    /// `ORDER BY` clause; effective price so sales sort where shoppers expect.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::PriceAsc => "COALESCE(LEAST(sale_price, price), price) ASC, id ASC",
            Self::PriceDesc => "COALESCE(LEAST(sale_price, price), price) DESC, id DESC",
            Self::Name => "name ASC, id ASC",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Name => "name",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Name => "Name",
        }
    }
}

/// Filters for product listing and counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category_id: Option<CategoryId>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    pub sort: ProductSort,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category_id: None,
            search: None,
            sort: ProductSort::default(),
            limit: 24,
            offset: 0,
        }
    }
}

impl ProductQuery {
    /// Search term with surrounding whitespace removed, if any is left.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Fields an admin submits to create or update a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub stock: i32,
    pub is_featured: bool,
    pub requires_prescription: bool,
    pub payment_link: Option<String>,
}

impl ProductInput {
    /// First validation failure, if any.
    #[must_use]
    pub fn validation_error(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("name is required");
        }
        if self.price.is_sign_negative() {
            return Some("price must not be negative");
        }
        if self.sale_price.is_some_and(|s| s.is_sign_negative()) {
            return Some("sale price must not be negative");
        }
        if self.stock < 0 {
            return Some("stock must not be negative");
        }
        if let Some(link) = self.payment_link.as_deref()
            && !is_payment_url(link)
        {
            return Some("payment link must be an http(s) URL");
        }
        None
    }
}

/// Absolute http(s) URL that can go into a `Location` header unchanged.
fn is_payment_url(link: &str) -> bool {
    if !link.bytes().all(|b| b.is_ascii_graphic()) {
        return false;
    }
    url::Url::parse(link)
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating or renaming a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// A home page carousel slide.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CarouselSlide {
    pub id: SlideId,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub button_text: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating or editing a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideInput {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub button_text: Option<String>,
    pub is_active: bool,
}

/// Direction for reordering a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    pub(crate) fn product(id: i32, name: &str, price: Decimal) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            category_id: None,
            name: name.to_string(),
            slug: apothecary_core::Slug::from_title(name)
                .map_or_else(|| format!("product-{id}"), |s| s.to_string()),
            description: format!("{name} description"),
            price,
            sale_price: None,
            image_url: None,
            stock: 10,
            is_featured: false,
            requires_prescription: false,
            payment_link: Some(format!("https://pay.example.test/{id}")),
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn product_input(name: &str, price: Decimal) -> ProductInput {
        ProductInput {
            category_id: None,
            name: name.to_string(),
            description: String::new(),
            price,
            sale_price: None,
            image_url: None,
            stock: 5,
            is_featured: false,
            requires_prescription: false,
            payment_link: None,
        }
    }
}
