//! Category management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use apothecary_core::CategoryId;

use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryInput, Toast};
use crate::routes::forms::{non_empty, redirect_with_toast};
use crate::session_state::PageContext;
use crate::state::AppState;

/// Category list with create and inline edit forms.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories.html")]
pub struct CategoriesTemplate {
    pub ctx: PageContext,
    pub categories: Vec<Category>,
}

/// Category form data.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl CategoryForm {
    fn into_input(self) -> Option<CategoryInput> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return None;
        }
        Some(CategoryInput {
            name,
            description: non_empty(self.description),
            image_url: non_empty(self.image_url),
        })
    }
}

pub async fn index(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
) -> impl IntoResponse {
    CategoriesTemplate {
        ctx,
        categories: state.categories().list().await,
    }
}

/// Create a category. The slug is derived from the name.
#[instrument(skip_all, fields(admin_id = %admin.user.id))]
pub async fn create(
    admin: RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Response {
    let Some(input) = form.into_input() else {
        let toast = Toast::error("Category name is required");
        return redirect_with_toast(&session, toast, "/admin/categories").await;
    };

    let toast = match state.categories().create(&input).await {
        Some(category) => {
            tracing::info!(category_id = %category.id, "Category created");
            Toast::success(format!("Created {}", category.name))
        }
        None => Toast::error("The category could not be created. Is the name already in use?"),
    };
    redirect_with_toast(&session, toast, "/admin/categories").await
}

#[instrument(skip_all, fields(admin_id = %admin.user.id, category_id = %id))]
pub async fn update(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Response {
    let Some(input) = form.into_input() else {
        let toast = Toast::error("Category name is required");
        return redirect_with_toast(&session, toast, "/admin/categories").await;
    };

    let toast = match state.categories().update(id, &input).await {
        Some(category) => Toast::success(format!("Saved {}", category.name)),
        None => Toast::error("The category could not be saved"),
    };
    redirect_with_toast(&session, toast, "/admin/categories").await
}

/// Delete a category. Its products become uncategorised.
#[instrument(skip_all, fields(admin_id = %admin.user.id, category_id = %id))]
pub async fn delete(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    session: Session,
) -> Response {
    let toast = if state.categories().delete(id).await {
        tracing::info!("Category deleted");
        Toast::success("Category deleted")
    } else {
        Toast::error("The category could not be deleted")
    };
    redirect_with_toast(&session, toast, "/admin/categories").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_form_requires_name() {
        let blank = CategoryForm {
            name: "   ".to_string(),
            description: None,
            image_url: None,
        };
        assert!(blank.into_input().is_none());

        let form = CategoryForm {
            name: " Skin Care ".to_string(),
            description: Some(String::new()),
            image_url: Some("https://img.test/skin.png".to_string()),
        };
        assert_eq!(
            form.into_input(),
            Some(CategoryInput {
                name: "Skin Care".to_string(),
                description: None,
                image_url: Some("https://img.test/skin.png".to_string()),
            })
        );
    }
}
