//! Checkout handoff.
//!
//! Payment happens on the provider's hosted page. For signed-in customers a
//! pending order is recorded first so it shows in their order history.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use apothecary_core::ProductId;

use crate::error::AppError;
use crate::middleware::OptionalAuth;
use crate::models::Toast;
use crate::routes::forms::redirect_with_toast;
use crate::state::AppState;

/// Record a pending order (when signed in) and redirect to the payment link.
///
/// Products without a payment link or stock send the visitor back to the
/// product page with a toast.
#[instrument(skip(state, session, user))]
pub async fn checkout(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response, AppError> {
    let product = state
        .products()
        .get(product_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let Some(payment_link) = product
        .payment_link
        .clone()
        .filter(|_| product.can_checkout())
    else {
        let back = format!("/products/{}", product.slug);
        let toast = Toast::error(format!("{} is not available to buy online", product.name));
        return Ok(redirect_with_toast(&session, toast, &back).await);
    };

    if let Some(user) = user {
        match state.profiles().record_checkout(user.id, &product).await {
            Some(order) => tracing::info!(
                order = %order.reference,
                product_id = %product.id,
                "Checkout started"
            ),
            None => tracing::warn!(product_id = %product.id, "Checkout not recorded"),
        }
    }

    Ok(Redirect::to(&payment_link).into_response())
}
