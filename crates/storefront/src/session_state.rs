//! Per-visitor state kept in the server session.
//!
//! Reads never fail a request: a session that cannot be read behaves like a
//! fresh one. Writes return the session error so handlers can decide.
//! Concurrent writes to the same key are last-write-wins.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use apothecary_core::{ProductId, Theme};

use crate::models::{CurrentUser, SavedArticles, Toast, Wishlist, session_keys};

async fn read<T: DeserializeOwned + Default>(session: &Session, key: &str) -> T {
    match session.get::<T>(key).await {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read session value");
            T::default()
        }
    }
}

async fn write<T: Serialize + Send + Sync>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), SessionError> {
    session.insert(key, value).await
}

// =============================================================================
// Signed-in user
// =============================================================================

pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Store the signed-in user under a fresh session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(session: &Session, user: &CurrentUser) -> Result<(), SessionError> {
    session.cycle_id().await?;
    write(session, session_keys::CURRENT_USER, user).await
}

/// Sign out. The wishlist, theme and other visitor state survive.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<Option<CurrentUser>, SessionError> {
    let user = session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.cycle_id().await?;
    Ok(user)
}

// =============================================================================
// Wishlist and saved articles
// =============================================================================

pub async fn wishlist(session: &Session) -> Wishlist {
    read(session, session_keys::WISHLIST).await
}

/// Toggle a product. Returns whether it is now wishlisted.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn toggle_wishlist(session: &Session, product: ProductId) -> Result<bool, SessionError> {
    let mut list = wishlist(session).await;
    let present = list.toggle(product);
    write(session, session_keys::WISHLIST, &list).await?;
    Ok(present)
}

/// Drop a product from the wishlist, if present.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn remove_from_wishlist(
    session: &Session,
    product: ProductId,
) -> Result<bool, SessionError> {
    let mut list = wishlist(session).await;
    if !list.remove(&product) {
        return Ok(false);
    }
    write(session, session_keys::WISHLIST, &list).await?;
    Ok(true)
}

pub async fn saved_articles(session: &Session) -> SavedArticles {
    read(session, session_keys::SAVED_ARTICLES).await
}

/// Toggle an article slug. Returns whether it is now saved.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn toggle_saved_article(session: &Session, slug: &str) -> Result<bool, SessionError> {
    let mut saved = saved_articles(session).await;
    let present = saved.toggle(slug.to_string());
    write(session, session_keys::SAVED_ARTICLES, &saved).await?;
    Ok(present)
}

// =============================================================================
// Preferences
// =============================================================================

pub async fn theme(session: &Session) -> Theme {
    read(session, session_keys::THEME).await
}

/// Flip between light and dark. Returns the new theme.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn toggle_theme(session: &Session) -> Result<Theme, SessionError> {
    let next = theme(session).await.toggled();
    write(session, session_keys::THEME, &next).await?;
    Ok(next)
}

pub async fn welcome_seen(session: &Session) -> bool {
    read(session, session_keys::WELCOME_SEEN).await
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn dismiss_welcome(session: &Session) -> Result<(), SessionError> {
    write(session, session_keys::WELCOME_SEEN, &true).await
}

// =============================================================================
// Toasts
// =============================================================================

/// Queue a flash message for the next rendered page. Failures are logged.
pub async fn push_toast(session: &Session, toast: Toast) {
    let mut toasts: Vec<Toast> = read(session, session_keys::TOASTS).await;
    toasts.push(toast);
    if let Err(e) = write(session, session_keys::TOASTS, &toasts).await {
        tracing::warn!(error = %e, "Failed to queue toast");
    }
}

/// Remove and return queued flash messages.
pub async fn take_toasts(session: &Session) -> Vec<Toast> {
    match session.remove::<Vec<Toast>>(session_keys::TOASTS).await {
        Ok(toasts) => toasts.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read toasts");
            Vec::new()
        }
    }
}

// =============================================================================
// Page context
// =============================================================================

/// Everything the base layout needs: user, theme, toasts, wishlist badge.
///
/// Extracting it drains pending toasts, so use it only in handlers that
/// render a full page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub theme: Theme,
    pub toasts: Vec<Toast>,
    pub wishlist_count: usize,
    /// Request path, recorded with feedback submissions.
    pub path: String,
}

impl PageContext {
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }

    #[must_use]
    pub const fn theme_name(&self) -> &'static str {
        self.theme.as_str()
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_string();
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self {
                path,
                ..Self::default()
            });
        };

        Ok(Self {
            user: current_user(session).await,
            theme: theme(session).await,
            toasts: take_toasts(session).await,
            wishlist_count: wishlist(session).await.len(),
            path,
        })
    }
}

/// Whether the request came from the page script asking for a fragment.
#[derive(Debug, Clone, Copy)]
pub struct FragmentRequest(pub bool);

impl<S> FromRequestParts<S> for FragmentRequest
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.headers.contains_key("hx-request")))
    }
}
