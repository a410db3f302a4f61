//! Authentication route handlers.
//!
//! Sign-in goes through the hosted identity provider, either with email and
//! password or with an OAuth provider (authorization code + PKCE). Every
//! successful sign-in syncs the local profile, merges the session wishlist
//! into saved items and stores a [`CurrentUser`] in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use apothecary_core::Email;

use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, Toast, session_keys};
use crate::routes::forms::{non_empty, redirect_with_toast};
use crate::services::identity::{AuthSession, Pkce, SignUpOutcome, random_token};
use crate::services::IdentityError;
use crate::session_state::{self, PageContext};
use crate::state::AppState;

/// Minimum password length accepted on the register form.
const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub full_name: Option<String>,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Parameters the identity provider appends to the callback URL.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Message shown for an `?error=` code.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Incorrect email or password.",
        "email_taken" => "An account with this email already exists.",
        "password_mismatch" => "Passwords do not match.",
        "password_too_short" => "Passwords need at least 8 characters.",
        "invalid_email" => "Please enter a valid email address.",
        "provider" => "That sign-in method is not available.",
        "oauth_denied" => "Sign-in was cancelled.",
        "invalid_state" | "missing_code" => "Your sign-in link expired. Please try again.",
        "session" => "We could not start your session. Please try again.",
        "rate_limited" => "Too many attempts. Please wait and try again.",
        _ => "Sign-in is unavailable right now. Please try again.",
    }
}

/// Message shown for a `?success=` code.
fn success_message(code: &str) -> &'static str {
    match code {
        "confirm_email" => "Check your email to confirm your account, then sign in.",
        "email_sent" => "If an account exists for that email, a reset link is on its way.",
        _ => "Done.",
    }
}

/// Redirect code for a failed identity call.
const fn failure_code(error: &IdentityError) -> &'static str {
    match error {
        IdentityError::InvalidCredentials => "credentials",
        IdentityError::EmailTaken => "email_taken",
        IdentityError::Api { status: 429, .. } => "rate_limited",
        _ => "unavailable",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
    pub providers: Vec<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub error: Option<&'static str>,
    pub providers: Vec<String>,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub ctx: PageContext,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

// =============================================================================
// Sign-in completion
// =============================================================================

/// Turn a provider session into a signed-in storefront session.
///
/// The profile row is upserted from the provider's user record; when that
/// fails the user is still signed in, without admin rights.
async fn complete_sign_in(
    state: &AppState,
    session: &Session,
    auth: AuthSession,
) -> Result<CurrentUser, tower_sessions::session::Error> {
    let profiles = state.profiles();
    let seed = auth.user.profile_seed();
    let profile = match &seed {
        Some(seed) => profiles.sync_profile(seed).await,
        None => {
            tracing::warn!(user_id = %auth.user.id, "Identity user has no email");
            None
        }
    };

    let email = seed.map(|s| s.email).unwrap_or_default();
    let user = CurrentUser {
        id: auth.user.user_id(),
        display_name: profile.as_ref().map_or_else(
            || auth.user.full_name().unwrap_or(&email).to_string(),
            |p| p.display_name().to_string(),
        ),
        is_admin: profile.as_ref().is_some_and(|p| p.is_admin),
        email,
        access_token: auth.access_token,
    };

    session_state::set_current_user(session, &user).await?;

    let wishlist = session_state::wishlist(session).await;
    let merged = profiles.merge_wishlist(user.id, &wishlist).await;
    if merged > 0 {
        tracing::info!(user_id = %user.id, merged, "Merged wishlist into saved items");
    }

    set_sentry_user(&user.id, Some(&user.email));
    add_breadcrumb("auth", "Signed in", None);
    tracing::info!(user_id = %user.id, "User signed in");
    Ok(user)
}

/// Finish sign-in and redirect to the profile, or back to login on failure.
async fn sign_in_and_redirect(state: &AppState, session: &Session, auth: AuthSession) -> Response {
    match complete_sign_in(state, session, auth).await {
        Ok(user) => {
            let greeting = format!("Welcome back, {}", user.display_name);
            redirect_with_toast(session, Toast::success(greeting), "/profile").await
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to store signed-in user");
            Redirect::to("/auth/login?error=session").into_response()
        }
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
    ctx: PageContext,
) -> Response {
    if user.is_some() {
        return Redirect::to("/profile").into_response();
    }

    LoginTemplate {
        ctx,
        error: query.error.as_deref().map(error_message),
        success: query.success.as_deref().map(success_message),
        providers: state.config().backend.oauth_providers.clone(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_lowercase();
    match state
        .identity()
        .sign_in_with_password(&email, &form.password)
        .await
    {
        Ok(auth) => sign_in_and_redirect(&state, &session, auth).await,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            Redirect::to(&format!("/auth/login?error={}", failure_code(&e))).into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    ctx: PageContext,
) -> impl IntoResponse {
    RegisterTemplate {
        ctx,
        error: query.error.as_deref().map(error_message),
        providers: state.config().backend.oauth_providers.clone(),
    }
}

/// Check the register form before calling the provider.
fn register_form_error(form: &RegisterForm) -> Option<&'static str> {
    if Email::parse(form.email.trim()).is_err() {
        return Some("invalid_email");
    }
    if form.password != form.password_confirm {
        return Some("password_mismatch");
    }
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Some("password_too_short");
    }
    None
}

/// Handle registration form submission.
///
/// If the provider requires email confirmation the user is sent to the login
/// page with a notice; otherwise they are signed in immediately.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if let Some(code) = register_form_error(&form) {
        return Redirect::to(&format!("/auth/register?error={code}")).into_response();
    }

    let email = form.email.trim().to_lowercase();
    let full_name = non_empty(form.full_name).unwrap_or_default();
    match state
        .identity()
        .sign_up(&email, &form.password, &full_name)
        .await
    {
        Ok(SignUpOutcome::SignedIn(auth)) => sign_in_and_redirect(&state, &session, auth).await,
        Ok(SignUpOutcome::ConfirmationRequired) => {
            Redirect::to("/auth/login?success=confirm_email").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            Redirect::to(&format!("/auth/register?error={}", failure_code(&e))).into_response()
        }
    }
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page(
    Query(query): Query<MessageQuery>,
    ctx: PageContext,
) -> impl IntoResponse {
    ForgotPasswordTemplate {
        ctx,
        error: query.error.as_deref().map(error_message),
        success: query.success.as_deref().map(success_message),
    }
}

/// Handle forgot password form submission.
///
/// Always reports success so the form cannot reveal which emails have accounts.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let email = form.email.trim().to_lowercase();
    if Email::parse(&email).is_err() {
        return Redirect::to("/auth/forgot-password?error=invalid_email").into_response();
    }

    if let Err(e) = state.identity().recover_password(&email).await {
        tracing::warn!(error = %e, "Password recovery request failed");
    }

    Redirect::to("/auth/forgot-password?success=email_sent").into_response()
}

// =============================================================================
// OAuth Routes
// =============================================================================

/// Start an OAuth sign-in.
///
/// Stores a PKCE verifier and a random state in the session, then redirects
/// to the provider. The state travels in the callback URL.
#[instrument(skip(state, session))]
pub async fn oauth_start(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    session: Session,
) -> Response {
    if !state
        .config()
        .backend
        .oauth_providers
        .iter()
        .any(|p| *p == provider)
    {
        return Redirect::to("/auth/login?error=provider").into_response();
    }

    let pkce = Pkce::generate();
    let oauth_state = random_token(32);

    if let Err(e) = session
        .insert(session_keys::OAUTH_VERIFIER, &pkce.verifier)
        .await
    {
        tracing::error!(error = %e, "Failed to store OAuth verifier in session");
        return Redirect::to("/auth/login?error=session").into_response();
    }
    if let Err(e) = session.insert(session_keys::OAUTH_STATE, &oauth_state).await {
        tracing::error!(error = %e, "Failed to store OAuth state in session");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    let callback = format!(
        "{}/auth/callback?state={oauth_state}",
        state.config().base_url
    );
    let url = state
        .identity()
        .authorize_url(&provider, &callback, &pkce.challenge);
    Redirect::to(&url).into_response()
}

/// Handle the OAuth callback: check state, exchange the code with the
/// stored verifier and sign in.
#[instrument(skip_all)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    // Single use, whatever the outcome
    let verifier = session
        .remove::<String>(session_keys::OAUTH_VERIFIER)
        .await
        .ok()
        .flatten();
    let expected_state = session
        .remove::<String>(session_keys::OAUTH_STATE)
        .await
        .ok()
        .flatten();

    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!(
            error = %error,
            description = %description,
            "OAuth provider returned an error"
        );
        return Redirect::to("/auth/login?error=oauth_denied").into_response();
    }

    let Some(code) = query.code else {
        return Redirect::to("/auth/login?error=missing_code").into_response();
    };

    let state_matches = matches!(
        (&expected_state, &query.state),
        (Some(expected), Some(received)) if expected == received
    );
    let Some(verifier) = verifier.filter(|_| state_matches) else {
        tracing::warn!("OAuth callback with missing or mismatched state");
        return Redirect::to("/auth/login?error=invalid_state").into_response();
    };

    match state.identity().exchange_code(&code, &verifier).await {
        Ok(auth) => sign_in_and_redirect(&state, &session, auth).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to exchange OAuth code");
            Redirect::to("/auth/login?error=unavailable").into_response()
        }
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
///
/// Revokes the provider session (best effort) and removes the user from the
/// session. The wishlist and theme stay with the browser.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    match session_state::clear_current_user(&session).await {
        Ok(Some(user)) => {
            if let Err(e) = state.identity().sign_out(&user.access_token).await {
                tracing::warn!(error = %e, "Failed to revoke identity session");
            }
            tracing::info!(user_id = %user.id, "User signed out");
        }
        Ok(None) => {}
        Err(e) => tracing::error!(error = %e, "Failed to clear session"),
    }

    clear_sentry_user();
    redirect_with_toast(&session, Toast::info("You have been signed out"), "/").await
}
