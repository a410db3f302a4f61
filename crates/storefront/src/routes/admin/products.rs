//! Product management.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use apothecary_core::{CategoryId, Price, ProductId};

use super::{MultipartFields, store_image, upload_error_message};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Category, Product, ProductInput, ProductQuery, Toast};
use crate::routes::forms::{parse_amount, redirect_with_toast};
use crate::routes::views::{Pagination, page_offset};
use crate::session_state::PageContext;
use crate::state::AppState;

/// Products per admin list page.
const PER_PAGE: i64 = 20;

/// Admin product list query.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// Product row for the admin table.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: String,
    pub sale_price: Option<String>,
    pub stock: i32,
    pub is_featured: bool,
    pub requires_prescription: bool,
    pub category: Option<String>,
}

impl ProductRow {
    fn new(product: &Product, category_names: &HashMap<CategoryId, String>) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: Price::usd(product.price).display(),
            sale_price: product.sale_price.map(|p| Price::usd(p).display()),
            stock: product.stock,
            is_featured: product.is_featured,
            requires_prescription: product.requires_prescription,
            category: product
                .category_id
                .and_then(|id| category_names.get(&id).cloned()),
        }
    }
}

/// Admin product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductRow>,
    pub search: Option<String>,
    pub total: i64,
    pub pagination: Pagination,
}

/// Category choice in the product form.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: CategoryId,
    pub name: String,
    pub selected: bool,
}

/// Submitted product form, kept as text so it can be shown again on error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFormValues {
    pub name: String,
    pub description: String,
    pub price: String,
    pub sale_price: String,
    pub stock: String,
    pub category_id: String,
    pub is_featured: bool,
    pub requires_prescription: bool,
    pub payment_link: String,
    pub image_url: String,
}

impl ProductFormValues {
    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            sale_price: product.sale_price.map(|p| p.to_string()).unwrap_or_default(),
            stock: product.stock.to_string(),
            category_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            is_featured: product.is_featured,
            requires_prescription: product.requires_prescription,
            payment_link: product.payment_link.clone().unwrap_or_default(),
            image_url: product.image_url.clone().unwrap_or_default(),
        }
    }

    fn from_fields(form: &MultipartFields) -> Self {
        Self {
            name: form.text_or_empty("name"),
            description: form.text_or_empty("description"),
            price: form.text_or_empty("price"),
            sale_price: form.text_or_empty("sale_price"),
            stock: form.text_or_empty("stock"),
            category_id: form.text_or_empty("category_id"),
            is_featured: form.flag("is_featured"),
            requires_prescription: form.flag("requires_prescription"),
            payment_link: form.text_or_empty("payment_link"),
            image_url: form.text_or_empty("image_url"),
        }
    }

    /// Parse into a product input, or the message to show on the form.
    fn to_input(&self) -> Result<ProductInput, String> {
        let price = parse_amount(&self.price).ok_or("Price must be a number")?;
        let sale_price = match self.sale_price.as_str() {
            "" => None,
            raw => Some(parse_amount(raw).ok_or("Sale price must be a number")?),
        };
        let stock = match self.stock.as_str() {
            "" => 0,
            raw => raw
                .parse::<i32>()
                .map_err(|_| "Stock must be a whole number")?,
        };
        let category_id = match self.category_id.as_str() {
            "" => None,
            raw => Some(CategoryId::new(
                raw.parse::<i32>().map_err(|_| "Unknown category")?,
            )),
        };

        let input = ProductInput {
            category_id,
            name: self.name.clone(),
            description: self.description.clone(),
            price,
            sale_price,
            image_url: Some(self.image_url.clone()).filter(|u| !u.is_empty()),
            stock,
            is_featured: self.is_featured,
            requires_prescription: self.requires_prescription,
            payment_link: Some(self.payment_link.clone()).filter(|l| !l.is_empty()),
        };

        match input.validation_error() {
            Some(reason) => Err(capitalize(reason)),
            None => Ok(input),
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// New/edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    pub heading: String,
    pub action: String,
    pub values: ProductFormValues,
    pub categories: Vec<CategoryOption>,
    pub error: Option<String>,
}

impl ProductFormTemplate {
    fn new(
        ctx: PageContext,
        product: Option<&Product>,
        values: ProductFormValues,
        categories: &[Category],
        error: Option<String>,
    ) -> Self {
        let (heading, action) = match product {
            Some(p) => (
                format!("Edit {}", p.name),
                format!("/admin/products/{}", p.id),
            ),
            None => ("New product".to_string(), "/admin/products".to_string()),
        };
        Self {
            categories: categories
                .iter()
                .map(|c| CategoryOption {
                    id: c.id,
                    name: c.name.clone(),
                    selected: values.category_id == c.id.to_string(),
                })
                .collect(),
            ctx,
            heading,
            action,
            values,
            error,
        }
    }
}

/// Admin product list.
#[instrument(skip(admin, state, ctx), fields(admin_id = %admin.user.id))]
pub async fn index(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    ctx: PageContext,
) -> impl IntoResponse {
    let (page, offset) = page_offset(query.page, PER_PAGE);
    let product_query = ProductQuery {
        search: query.q.clone(),
        limit: PER_PAGE,
        offset,
        ..ProductQuery::default()
    };
    let search = product_query.search_term().map(str::to_string);

    let products = state.products();
    let categories = state.categories();
    let (items, total, categories) = tokio::join!(
        products.list(&product_query),
        products.count(&product_query),
        categories.list(),
    );
    let category_names: HashMap<_, _> = categories.into_iter().map(|c| (c.id, c.name)).collect();

    let base = match &search {
        Some(q) => format!("/admin/products?q={}", urlencoding::encode(q)),
        None => "/admin/products".to_string(),
    };

    ProductsIndexTemplate {
        ctx,
        products: items
            .iter()
            .map(|p| ProductRow::new(p, &category_names))
            .collect(),
        search,
        total,
        pagination: Pagination::new(page, total, PER_PAGE, &base),
    }
}

/// Empty product form.
pub async fn new_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
) -> impl IntoResponse {
    let categories = state.categories().list().await;
    let values = ProductFormValues {
        stock: "0".to_string(),
        ..ProductFormValues::default()
    };
    ProductFormTemplate::new(ctx, None, values, &categories, None)
}

/// Edit form for an existing product.
pub async fn edit(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    ctx: PageContext,
) -> Result<ProductFormTemplate, AppError> {
    let product = state
        .products()
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let categories = state.categories().list().await;
    let values = ProductFormValues::from_product(&product);
    Ok(ProductFormTemplate::new(
        ctx,
        Some(&product),
        values,
        &categories,
        None,
    ))
}

/// Parse the form and upload a new image, if any.
async fn read_input(
    state: &AppState,
    form: MultipartFields,
) -> (ProductFormValues, Result<ProductInput, String>) {
    let mut values = ProductFormValues::from_fields(&form);
    let mut input = values.to_input();

    if let (Ok(product), Some(image)) = (&mut input, form.image) {
        match store_image(state, image).await {
            Ok(url) => {
                values.image_url.clone_from(&url);
                product.image_url = Some(url);
            }
            Err(e) => input = Err(upload_error_message(&e)),
        }
    }

    (values, input)
}

/// Create a product.
#[instrument(skip_all, fields(admin_id = %admin.user.id))]
pub async fn create(
    admin: RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = MultipartFields::read(multipart).await?;
    let (values, input) = read_input(&state, form).await;

    let error = match input {
        Ok(input) => match state.products().create(&input).await {
            Some(product) => {
                tracing::info!(product_id = %product.id, "Product created");
                let toast = Toast::success(format!("Created {}", product.name));
                return Ok(redirect_with_toast(&session, toast, "/admin/products").await);
            }
            None => "The product could not be saved. Please try again.".to_string(),
        },
        Err(message) => message,
    };

    let categories = state.categories().list().await;
    Ok(ProductFormTemplate::new(ctx, None, values, &categories, Some(error)).into_response())
}

/// Update a product.
#[instrument(skip_all, fields(admin_id = %admin.user.id, product_id = %id))]
pub async fn update(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    session: Session,
    ctx: PageContext,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let products = state.products();
    let existing = products
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let form = MultipartFields::read(multipart).await?;
    let (values, input) = read_input(&state, form).await;

    let error = match input {
        Ok(input) => match products.update(id, &input).await {
            Some(product) => {
                tracing::info!("Product updated");
                let toast = Toast::success(format!("Saved {}", product.name));
                return Ok(redirect_with_toast(&session, toast, "/admin/products").await);
            }
            None => "The product could not be saved. Please try again.".to_string(),
        },
        Err(message) => message,
    };

    let categories = state.categories().list().await;
    Ok(
        ProductFormTemplate::new(ctx, Some(&existing), values, &categories, Some(error))
            .into_response(),
    )
}

/// Delete a product.
#[instrument(skip_all, fields(admin_id = %admin.user.id, product_id = %id))]
pub async fn delete(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    session: Session,
) -> Response {
    let toast = if state.products().delete(id).await {
        tracing::info!("Product deleted");
        Toast::success("Product deleted")
    } else {
        Toast::error("The product could not be deleted")
    };
    redirect_with_toast(&session, toast, "/admin/products").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::fixtures::{dec, product};

    fn values() -> ProductFormValues {
        ProductFormValues {
            name: "Zinc 25mg".to_string(),
            price: "$9.50".to_string(),
            stock: "12".to_string(),
            category_id: "3".to_string(),
            is_featured: true,
            ..ProductFormValues::default()
        }
    }

    #[test]
    fn test_form_values_parse_into_input() {
        let input = values().to_input();
        let input = input.as_ref().ok();
        assert_eq!(input.map(|i| i.price), Some(dec("9.50")));
        assert_eq!(input.map(|i| i.stock), Some(12));
        assert_eq!(input.and_then(|i| i.category_id), Some(CategoryId::new(3)));
        assert_eq!(input.and_then(|i| i.sale_price), None);
        assert_eq!(input.and_then(|i| i.payment_link.clone()), None);
    }

    #[test]
    fn test_form_values_report_bad_fields() {
        let bad_price = ProductFormValues {
            price: "cheap".to_string(),
            ..values()
        };
        assert_eq!(bad_price.to_input(), Err("Price must be a number".to_string()));

        let bad_stock = ProductFormValues {
            stock: "1.5".to_string(),
            ..values()
        };
        assert_eq!(
            bad_stock.to_input(),
            Err("Stock must be a whole number".to_string())
        );

        let no_name = ProductFormValues {
            name: String::new(),
            ..values()
        };
        assert_eq!(no_name.to_input(), Err("Name is required".to_string()));

        let bad_link = ProductFormValues {
            payment_link: "javascript:alert(1)".to_string(),
            ..values()
        };
        assert_eq!(
            bad_link.to_input(),
            Err("Payment link must be an http(s) URL".to_string())
        );
    }

    #[test]
    fn test_form_values_from_product_round_trip() {
        let product = product(7, "Cough Syrup", dec("6.25"));
        let values = ProductFormValues::from_product(&product);
        assert_eq!(values.name, "Cough Syrup");
        let input = values.to_input();
        assert_eq!(input.map(|i| i.price), Ok(dec("6.25")));
    }

    #[test]
    fn test_row_uses_category_name() {
        let mut product = product(1, "Vitamin D", dec("4.00"));
        product.category_id = Some(CategoryId::new(2));
        let names = HashMap::from([(CategoryId::new(2), "Vitamins".to_string())]);
        let row = ProductRow::new(&product, &names);
        assert_eq!(row.category.as_deref(), Some("Vitamins"));
        assert_eq!(row.price, "$4.00");
    }
}
