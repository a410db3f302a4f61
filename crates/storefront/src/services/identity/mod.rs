//! Hosted identity provider client.
//!
//! Wraps the provider's REST auth API (`/auth/v1/...`). Every request carries
//! the project's public `apikey`; user-scoped calls add the user's access
//! token as a bearer token.
//!
//! # OAuth Flow
//!
//! 1. Generate a [`Pkce`] pair and a random state, keep both in the session
//! 2. Redirect to [`IdentityClient::authorize_url`]
//! 3. The provider redirects back to `/auth/callback?code=...`
//! 4. Exchange the code and verifier with [`IdentityClient::exchange_code`]

mod error;

pub use error::IdentityError;

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::{Rng, RngCore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use apothecary_core::UserId;

use crate::config::BackendConfig;
use crate::models::ProfileSeed;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata the provider stores with the user (sign-up data, OAuth claims).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub picture: Option<String>,
}

/// A user as the identity provider reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl IdentityUser {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::new(self.id)
    }

    /// Name from sign-up data, falling back to the OAuth provider's claim.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata
            .full_name
            .as_deref()
            .or(self.user_metadata.name.as_deref())
            .filter(|n| !n.trim().is_empty())
    }

    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.user_metadata
            .avatar_url
            .as_deref()
            .or(self.user_metadata.picture.as_deref())
    }

    /// Profile data to write on sign-in. `None` for users without an email.
    #[must_use]
    pub fn profile_seed(&self) -> Option<ProfileSeed> {
        let email = self.email.as_deref().filter(|e| !e.is_empty())?;
        Some(ProfileSeed {
            id: self.user_id(),
            email: email.to_lowercase(),
            full_name: self.full_name().map(str::to_owned),
            avatar_url: self.avatar_url().map(str::to_owned),
        })
    }
}

/// A signed-in session returned by the token endpoints.
#[derive(Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: IdentityUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Result of a sign-up.
#[derive(Debug)]
pub enum SignUpOutcome {
    /// Email confirmation is disabled; the user is signed in.
    SignedIn(AuthSession),
    /// The provider sent a confirmation email.
    ConfirmationRequired,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(AuthSession),
    User(IdentityUser),
}

/// Error body. The provider uses several shapes depending on the endpoint.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    error_code: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ApiErrorBody {
    fn message(&self) -> String {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("unknown error")
            .to_string()
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData<'a>,
}

#[derive(Serialize)]
struct SignUpData<'a> {
    full_name: &'a str,
}

#[derive(Serialize)]
struct PkceGrant<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

#[derive(Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

// ─────────────────────────────────────────────────────────────────────────────
// PKCE
// ─────────────────────────────────────────────────────────────────────────────

/// PKCE verifier and its S256 challenge.
#[derive(Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    /// Generate a fresh pair from 32 random bytes.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes))
    }

    #[must_use]
    pub fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

/// Generate a cryptographically secure random string.
#[must_use]
pub fn random_token(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the hosted identity provider.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl IdentityClient {
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            inner: Arc::new(IdentityClientInner {
                client: reqwest::Client::new(),
                base_url: config.url.trim_end_matches('/').to_string(),
                anon_key: config.anon_key.clone(),
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.inner.base_url)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidCredentials` for a wrong email or password.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("token?grant_type=password"))
            .json(&PasswordGrant { email, password });
        self.send_json(request).await
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::EmailTaken` when the email is already registered.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, IdentityError> {
        let request = self.inner.client.post(self.endpoint("signup")).json(&SignUpRequest {
            email,
            password,
            data: SignUpData { full_name },
        });
        let response: SignUpResponse = self.send_json(request).await?;
        Ok(match response {
            SignUpResponse::Session(session) => SignUpOutcome::SignedIn(session),
            SignUpResponse::User(user) => {
                tracing::info!(user_id = %user.id, "Sign-up awaiting email confirmation");
                SignUpOutcome::ConfirmationRequired
            }
        })
    }

    /// URL that starts an OAuth sign-in with `provider`.
    #[must_use]
    pub fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String {
        format!(
            "{}?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=s256",
            self.endpoint("authorize"),
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to),
            urlencoding::encode(code_challenge),
        )
    }

    /// Exchange an OAuth authorization code for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the code or verifier is rejected.
    #[tracing::instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<AuthSession, IdentityError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("token?grant_type=pkce"))
            .json(&PkceGrant {
                auth_code: code,
                code_verifier: verifier,
            });
        self.send_json(request).await
    }

    /// The user an access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or expired.
    pub async fn get_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        let request = self
            .inner
            .client
            .get(self.endpoint("user"))
            .bearer_auth(access_token);
        self.send_json(request).await
    }

    /// Send a password reset email.
    ///
    /// The provider answers the same way for unknown addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached or rate limits the request.
    #[tracing::instrument(skip(self))]
    pub async fn recover_password(&self, email: &str) -> Result<(), IdentityError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("recover"))
            .json(&RecoverRequest { email });
        self.send(request).await.map(|_| ())
    }

    /// Revoke the session behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the request.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("logout"))
            .bearer_auth(access_token);
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, IdentityError> {
        let response = request.header("apikey", &self.inner.anon_key).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, IdentityError> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Map an error response to the matching `IdentityError`.
fn api_error(status: u16, body: &str) -> IdentityError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed
        .error_code
        .as_deref()
        .or(parsed.error.as_deref())
        .unwrap_or_default();
    let message = parsed.message();

    match code {
        "invalid_grant" | "invalid_credentials" => IdentityError::InvalidCredentials,
        "user_already_exists" | "email_exists" => IdentityError::EmailTaken,
        _ if message.contains("already registered") => IdentityError::EmailTaken,
        _ => IdentityError::Api { status, message },
    }
}
