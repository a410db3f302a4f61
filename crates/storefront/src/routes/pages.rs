//! Static content page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use chrono::NaiveDate;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::session_state::PageContext;
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub description: String,
    pub updated_at: Option<NaiveDate>,
    pub content_html: String,
}

/// Serve a content page by slug.
fn serve_content_page(
    state: &AppState,
    slug: &str,
    ctx: PageContext,
) -> Result<ContentPageTemplate, AppError> {
    let page = state
        .content()
        .page(slug)
        .ok_or_else(|| AppError::NotFound(format!("page {slug}")))?;

    Ok(ContentPageTemplate {
        ctx,
        title: page.meta.title.clone(),
        description: page.meta.description.clone().unwrap_or_default(),
        updated_at: page.meta.updated_at,
        content_html: page.content_html.clone(),
    })
}

/// Display the About page.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist.
#[instrument(skip_all)]
pub async fn about(
    State(state): State<AppState>,
    ctx: PageContext,
) -> Result<ContentPageTemplate, AppError> {
    serve_content_page(&state, "about", ctx)
}
