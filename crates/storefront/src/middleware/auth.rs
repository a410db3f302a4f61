//! Authentication extractors.
//!
//! The signed-in user lives in the session (see [`crate::session_state`]).
//! `/admin` additionally checks the stored profile's admin flag on every
//! request, so revoking a grant takes effect without a new sign-in.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, UserProfile};
use crate::session_state;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// If the user is not signed in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not signed in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin,
    /// Unauthorized response (for fragment requests and missing sessions).
    Unauthorized,
    /// Signed in without admin rights.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => {
                (StatusCode::FORBIDDEN, "You do not have access to this page").into_response()
            }
        }
    }
}

async fn signed_in_user(parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    session_state::current_user(session).await.ok_or_else(|| {
        // Script-driven fragment requests cannot follow a login redirect
        if parts.headers.contains_key("hx-request") {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin
        }
    })
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        signed_in_user(parts).await.map(Self)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session_state::current_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

/// Extractor for `/admin` handlers: a signed-in user whose profile is an admin.
///
/// Anonymous visitors are redirected to login; other users get 403. A profile
/// that cannot be loaded counts as not admin.
pub struct RequireAdmin {
    pub user: CurrentUser,
    pub profile: UserProfile,
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = signed_in_user(parts).await?;
        let profile = state
            .profiles()
            .fetch_profile(user.id)
            .await
            .filter(|p| p.is_admin)
            .ok_or_else(|| {
                tracing::warn!(user_id = %user.id, "Admin access denied");
                AuthRejection::Forbidden
            })?;

        Ok(Self { user, profile })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[tokio::test]
    async fn test_require_auth_without_session_is_unauthorized() {
        let (mut parts, ()) = Request::builder()
            .uri("/profile")
            .body(())
            .unwrap_or_default()
            .into_parts();
        let result = RequireAuth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthRejection::Unauthorized)));
    }

    #[tokio::test]
    async fn test_require_auth_redirects_anonymous_page_requests() {
        let (mut parts, ()) = Request::builder()
            .uri("/profile")
            .body(())
            .unwrap_or_default()
            .into_parts();
        parts
            .extensions
            .insert(crate::session_state::tests::session());

        let result = RequireAuth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthRejection::RedirectToLogin)));
    }

    #[test]
    fn test_rejection_responses() {
        let response = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            AuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
