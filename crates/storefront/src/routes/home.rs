//! Home page, welcome popup and theme preference handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::content::Article;
use crate::filters;
use crate::models::{CarouselSlide, Category, Toast};
use crate::routes::forms::{local_path, redirect_with_toast};
use crate::routes::views::{ProductCard, product_cards};
use crate::session_state::{self, FragmentRequest, PageContext};
use crate::state::AppState;

/// Featured products shown on the home page.
const FEATURED_LIMIT: i64 = 8;

/// Articles shown under "From the pharmacist".
const RECENT_ARTICLES: usize = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub slides: Vec<CarouselSlide>,
    pub categories: Vec<Category>,
    pub featured: Vec<ProductCard>,
    pub articles: Vec<Article>,
    pub show_welcome: bool,
}

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> impl IntoResponse {
    let (carousel, categories, products) =
        (state.carousel(), state.categories(), state.products());
    let (slides, categories, featured) = tokio::join!(
        carousel.active(),
        categories.list(),
        products.featured(FEATURED_LIMIT),
    );
    let wishlist = session_state::wishlist(&session).await;

    HomeTemplate {
        ctx,
        slides,
        categories,
        featured: product_cards(&featured, &wishlist),
        articles: state
            .content()
            .recent(RECENT_ARTICLES, None)
            .into_iter()
            .cloned()
            .collect(),
        show_welcome: !session_state::welcome_seen(&session).await,
    }
}

/// Mark the welcome popup as seen.
#[instrument(skip_all)]
pub async fn dismiss_welcome(
    session: Session,
    FragmentRequest(fragment): FragmentRequest,
) -> Response {
    if let Err(e) = session_state::dismiss_welcome(&session).await {
        tracing::warn!(error = %e, "Failed to record welcome dismissal");
    }

    if fragment {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Redirect::to("/").into_response()
    }
}

/// Theme toggle form data.
#[derive(Debug, Deserialize)]
pub struct ThemeForm {
    pub return_to: Option<String>,
}

/// Flip between light and dark.
///
/// Fragment requests get the new theme name back so the script can update
/// the page in place.
#[instrument(skip_all)]
pub async fn toggle_theme(
    session: Session,
    FragmentRequest(fragment): FragmentRequest,
    Form(form): Form<ThemeForm>,
) -> Response {
    match session_state::toggle_theme(&session).await {
        Ok(theme) if fragment => theme.as_str().into_response(),
        Ok(_) => Redirect::to(local_path(form.return_to.as_deref(), "/")).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to toggle theme");
            if fragment {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            } else {
                redirect_with_toast(
                    &session,
                    Toast::error("Could not change the theme"),
                    local_path(form.return_to.as_deref(), "/"),
                )
                .await
            }
        }
    }
}
