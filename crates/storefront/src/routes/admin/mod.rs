//! Admin console route handlers.
//!
//! Every handler takes [`RequireAdmin`], so anonymous visitors are sent to
//! login and signed-in non-admins get 403. Product and carousel forms are
//! multipart so an image can be uploaded to object storage alongside the
//! text fields.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State},
    response::IntoResponse,
    routing::{get, post},
};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::ProductQuery;
use crate::routes::forms::{checked, non_empty};
use crate::services::StorageError;
use crate::services::storage::{MAX_UPLOAD_BYTES, object_path_for, validate_upload};
use crate::session_state::PageContext;
use crate::state::AppState;

mod carousel;
mod categories;
mod products;

/// Request body cap for multipart forms: one image plus the text fields.
const MULTIPART_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

/// Build the `/admin` router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new_product))
        .route("/products/{id}", post(products::update))
        .route("/products/{id}/edit", get(products::edit))
        .route("/products/{id}/delete", post(products::delete))
        .route(
            "/categories",
            get(categories::index).post(categories::create),
        )
        .route("/categories/{id}", post(categories::update))
        .route("/categories/{id}/delete", post(categories::delete))
        .route("/carousel", get(carousel::index).post(carousel::create))
        .route("/carousel/{id}", post(carousel::update))
        .route("/carousel/{id}/toggle", post(carousel::toggle))
        .route("/carousel/{id}/up", post(carousel::move_up))
        .route("/carousel/{id}/down", post(carousel::move_down))
        .route("/carousel/{id}/delete", post(carousel::delete))
        .layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT))
}

// =============================================================================
// Dashboard
// =============================================================================

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub admin_name: String,
    pub product_count: i64,
    pub category_count: usize,
    pub slide_count: usize,
    pub active_slide_count: usize,
    pub profile_count: i64,
    pub order_count: i64,
}

/// Admin dashboard with catalog and account counts.
#[instrument(skip_all, fields(admin_id = %admin.user.id))]
pub async fn dashboard(
    admin: RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
) -> impl IntoResponse {
    let (products, categories, carousel, profiles) = (
        state.products(),
        state.categories(),
        state.carousel(),
        state.profiles(),
    );
    let all_products = ProductQuery::default();
    let (product_count, categories, slides, profile_count, order_count) = tokio::join!(
        products.count(&all_products),
        categories.list(),
        carousel.list(),
        profiles.count_profiles(),
        profiles.count_orders(),
    );

    DashboardTemplate {
        ctx,
        admin_name: admin.profile.display_name().to_string(),
        product_count,
        category_count: categories.len(),
        active_slide_count: slides.iter().filter(|s| s.is_active).count(),
        slide_count: slides.len(),
        profile_count,
        order_count,
    }
}

// =============================================================================
// Multipart forms
// =============================================================================

/// An image file submitted with a form.
#[derive(Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Text fields and the optional `image` file of a multipart form.
#[derive(Debug, Default)]
pub struct MultipartFields {
    fields: HashMap<String, String>,
    pub image: Option<UploadedImage>,
}

impl MultipartFields {
    /// Drain a multipart body. An empty file input counts as no image.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for a malformed or oversized body.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.image = Some(UploadedImage {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Trimmed field value, `None` when missing or blank.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        non_empty(self.fields.get(name).cloned())
    }

    /// Trimmed field value, empty when missing.
    #[must_use]
    pub fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn insert_text(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_string(), value.to_string());
    }

    /// Whether a checkbox was ticked.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        checked(self.fields.get(name).map(String::as_str))
    }
}

/// Upload an image and return its public URL.
async fn store_image(state: &AppState, image: UploadedImage) -> Result<String, StorageError> {
    validate_upload(&image.content_type, image.bytes.len())?;
    let path = object_path_for(&image.file_name);
    let storage = state.storage();
    let stored = storage
        .upload(&path, image.bytes, &image.content_type)
        .await?;
    Ok(storage.public_url(&stored))
}

/// Message shown on the form when an upload fails.
fn upload_error_message(error: &StorageError) -> String {
    match error {
        StorageError::UnsupportedType(_) | StorageError::TooLarge(_) | StorageError::Empty => {
            format!("Image rejected: {error}")
        }
        _ => {
            tracing::error!(error = %error, "Image upload failed");
            "The image could not be uploaded. Please try again.".to_string()
        }
    }
}
