//! Wishlist handlers.
//!
//! The wishlist lives in the session so anonymous visitors can use it. For
//! signed-in users each toggle is mirrored to their saved items.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use apothecary_core::ProductId;

use crate::content::Article;
use crate::error::AppError;
use crate::filters;
use crate::models::Toast;
use crate::routes::forms::redirect_with_toast;
use crate::routes::views::{ProductCard, product_cards};
use crate::session_state::{self, FragmentRequest, PageContext};
use crate::state::AppState;

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist.html")]
pub struct WishlistTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductCard>,
    pub articles: Vec<Article>,
}

/// Heart button fragment, with an out-of-band badge count.
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: ProductId,
    pub wishlisted: bool,
    pub count: usize,
}

/// Display wishlisted products (newest first) and saved articles.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> impl IntoResponse {
    let wishlist = session_state::wishlist(&session).await;
    let products = state.products().by_ids(&wishlist.newest_first()).await;
    let saved = session_state::saved_articles(&session).await;

    WishlistTemplate {
        ctx,
        products: product_cards(&products, &wishlist),
        articles: state
            .content()
            .by_slugs(&saved.newest_first())
            .into_iter()
            .cloned()
            .collect(),
    }
}

/// Toggle a product in the wishlist.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    session: Session,
    FragmentRequest(fragment): FragmentRequest,
) -> Result<Response, AppError> {
    let product = state
        .products()
        .get(product_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let wishlisted = session_state::toggle_wishlist(&session, product.id).await?;

    if let Some(user) = session_state::current_user(&session).await {
        let profiles = state.profiles();
        let mirrored = if wishlisted {
            profiles.save_item(user.id, product.id).await
        } else {
            profiles.remove_saved_item(user.id, product.id).await
        };
        if !mirrored {
            tracing::debug!(product_id = %product.id, "Saved items not updated");
        }
    }

    if fragment {
        let count = session_state::wishlist(&session).await.len();
        return Ok(WishlistButtonTemplate {
            product_id: product.id,
            wishlisted,
            count,
        }
        .into_response());
    }

    let message = if wishlisted {
        format!("{} added to your wishlist", product.name)
    } else {
        format!("{} removed from your wishlist", product.name)
    };
    let back = format!("/products/{}", product.slug);
    Ok(redirect_with_toast(&session, Toast::success(message), &back).await)
}
