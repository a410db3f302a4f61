//! Display types shared by storefront templates.

use apothecary_core::ProductId;

use crate::models::{Product, Wishlist};

/// Product card data for grids, search results and the wishlist.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub discount_percent: Option<u32>,
    pub image_url: Option<String>,
    pub in_stock: bool,
    pub can_checkout: bool,
    pub requires_prescription: bool,
    pub wishlisted: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, wishlist: &Wishlist) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.effective_price().display(),
            compare_at_price: product.compare_at_price().map(|p| p.display()),
            discount_percent: product.discount_percent(),
            image_url: product.image_url.clone(),
            in_stock: product.in_stock(),
            can_checkout: product.can_checkout(),
            requires_prescription: product.requires_prescription,
            wishlisted: wishlist.contains(&product.id),
        }
    }
}

#[must_use]
pub fn product_cards(products: &[Product], wishlist: &Wishlist) -> Vec<ProductCard> {
    products
        .iter()
        .map(|p| ProductCard::new(p, wishlist))
        .collect()
}

/// Page links for a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pagination {
    /// `base` is the listing URL with every query parameter except `page`.
    #[must_use]
    pub fn new(page: u32, total_items: i64, per_page: i64, base: &str) -> Self {
        let per_page = per_page.max(1);
        let pages = (total_items.max(0) + per_page - 1) / per_page;
        let total_pages = u32::try_from(pages).unwrap_or(u32::MAX).max(1);
        let page = page.clamp(1, total_pages);
        let separator = if base.contains('?') { '&' } else { '?' };
        let link = |n: u32| format!("{base}{separator}page={n}");

        Self {
            page,
            total_pages,
            prev_url: (page > 1).then(|| link(page - 1)),
            next_url: (page < total_pages).then(|| link(page + 1)),
        }
    }

    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }
}

/// Row offset for a 1-based page number.
#[must_use]
pub fn page_offset(page: Option<u32>, per_page: i64) -> (u32, i64) {
    let page = page.unwrap_or(1).max(1);
    (page, i64::from(page - 1) * per_page)
}
