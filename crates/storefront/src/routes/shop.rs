//! Shop listing, product detail and search overlay handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::models::{Category, Product, ProductQuery, ProductSort};
use crate::routes::views::{Pagination, ProductCard, page_offset, product_cards};
use crate::session_state::{self, PageContext};
use crate::state::AppState;

/// Products per shop page.
const PER_PAGE: i64 = 12;

/// Related products on a detail page.
const RELATED_LIMIT: i64 = 4;

/// Results in the search overlay.
const SEARCH_LIMIT: i64 = 8;

/// Shop listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ShopQuery {
    /// Category slug.
    pub category: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
}

/// Unknown or empty sort values fall back to newest.
fn parse_sort(raw: Option<&str>) -> ProductSort {
    raw.and_then(|s| ProductSort::ALL.into_iter().find(|sort| sort.as_str() == s))
        .unwrap_or_default()
}

/// Listing URL without the page parameter.
fn listing_url(category: Option<&str>, search: Option<&str>, sort: ProductSort) -> String {
    let mut params = Vec::new();
    if let Some(slug) = category {
        params.push(format!("category={}", urlencoding::encode(slug)));
    }
    if let Some(q) = search {
        params.push(format!("q={}", urlencoding::encode(q)));
    }
    if sort != ProductSort::default() {
        params.push(format!("sort={}", sort.as_str()));
    }
    if params.is_empty() {
        "/shop".to_string()
    } else {
        format!("/shop?{}", params.join("&"))
    }
}

/// Sort option for the select box.
#[derive(Debug, Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Shop listing template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductCard>,
    pub categories: Vec<Category>,
    pub active_category: Option<Category>,
    pub search: Option<String>,
    pub sort_options: Vec<SortOption>,
    pub total: i64,
    pub pagination: Pagination,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/product.html")]
pub struct ProductTemplate {
    pub ctx: PageContext,
    pub product: Product,
    pub card: ProductCard,
    pub category: Option<Category>,
    pub related: Vec<ProductCard>,
}

/// Search overlay results fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_results.html")]
pub struct SearchResultsTemplate {
    pub query: String,
    pub products: Vec<ProductCard>,
}

/// Display the product listing.
#[instrument(skip(state, session, ctx))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    session: Session,
    ctx: PageContext,
) -> impl IntoResponse {
    let categories = state.categories().list().await;
    let active_category = query
        .category
        .as_deref()
        .and_then(|slug| categories.iter().find(|c| c.slug == slug))
        .cloned();
    let sort = parse_sort(query.sort.as_deref());
    let (page, offset) = page_offset(query.page, PER_PAGE);

    let product_query = ProductQuery {
        category_id: active_category.as_ref().map(|c| c.id),
        search: query.q.clone(),
        sort,
        limit: PER_PAGE,
        offset,
    };
    let search = product_query.search_term().map(str::to_string);

    let products = state.products();
    let (items, total) = tokio::join!(
        products.list(&product_query),
        products.count(&product_query)
    );
    let wishlist = session_state::wishlist(&session).await;

    let base = listing_url(
        active_category.as_ref().map(|c| c.slug.as_str()),
        search.as_deref(),
        sort,
    );

    ShopTemplate {
        ctx,
        products: product_cards(&items, &wishlist),
        categories,
        active_category,
        search,
        sort_options: ProductSort::ALL
            .into_iter()
            .map(|s| SortOption {
                value: s.as_str(),
                label: s.label(),
                selected: s == sort,
            })
            .collect(),
        total,
        pagination: Pagination::new(page, total, PER_PAGE, &base),
    }
}

/// Display a product.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
    ctx: PageContext,
) -> Result<ProductTemplate, AppError> {
    let product = state
        .products()
        .by_slug(&slug)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    let category = match product.category_id {
        Some(id) => state.categories().get(id).await,
        None => None,
    };

    let related = match product.category_id {
        Some(category_id) => {
            let query = ProductQuery {
                category_id: Some(category_id),
                limit: RELATED_LIMIT + 1,
                ..ProductQuery::default()
            };
            let mut items = state.products().list(&query).await;
            items.retain(|p| p.id != product.id);
            items.truncate(usize::try_from(RELATED_LIMIT).unwrap_or(0));
            items
        }
        None => Vec::new(),
    };

    let wishlist = session_state::wishlist(&session).await;
    Ok(ProductTemplate {
        ctx,
        card: ProductCard::new(&product, &wishlist),
        related: product_cards(&related, &wishlist),
        product,
        category,
    })
}

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Search overlay fragment. A blank query returns no results.
#[instrument(skip(state, session))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    session: Session,
) -> impl IntoResponse {
    let term = query.q.unwrap_or_default().trim().to_string();
    if term.is_empty() {
        return SearchResultsTemplate {
            query: term,
            products: Vec::new(),
        };
    }

    let product_query = ProductQuery {
        search: Some(term.clone()),
        limit: SEARCH_LIMIT,
        ..ProductQuery::default()
    };
    let items = state.products().list(&product_query).await;
    let wishlist = session_state::wishlist(&session).await;

    SearchResultsTemplate {
        query: term,
        products: product_cards(&items, &wishlist),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort(Some("price_asc")), ProductSort::PriceAsc);
        assert_eq!(parse_sort(Some("")), ProductSort::Newest);
        assert_eq!(parse_sort(Some("bogus")), ProductSort::Newest);
        assert_eq!(parse_sort(None), ProductSort::Newest);
    }

    #[test]
    fn test_listing_url() {
        assert_eq!(listing_url(None, None, ProductSort::Newest), "/shop");
        assert_eq!(
            listing_url(Some("vitamins"), Some("zinc tabs"), ProductSort::Name),
            "/shop?category=vitamins&q=zinc%20tabs&sort=name"
        );
    }
}
