//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `APOTHECARY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `APOTHECARY_BASE_URL` - Public URL for the storefront
//! - `APOTHECARY_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `BACKEND_URL` - Hosted backend base URL (auth + storage REST APIs)
//! - `BACKEND_ANON_KEY` - Public API key sent with every auth request
//! - `BACKEND_SERVICE_KEY` - Service-role key used for storage uploads
//!
//! ## Optional
//! - `APOTHECARY_HOST` - Bind address (default: 127.0.0.1)
//! - `APOTHECARY_PORT` - Listen port (default: 3000)
//! - `BACKEND_STORAGE_BUCKET` - Bucket for product images (default: product-images)
//! - `OAUTH_PROVIDERS` - Comma separated OAuth providers (default: google)
//! - `PROFILE_FETCH_TIMEOUT_MS` - Profile lookup timeout (default: 5000)
//! - `CATALOG_CACHE_TTL_SECS` - Home page catalog cache TTL (default: 300)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Hosted auth and storage backend
    pub backend: BackendConfig,
    /// Upper bound on a single profile lookup
    pub profile_fetch_timeout: Duration,
    /// TTL for cached home page catalog reads
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Hosted backend configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://abc.backend.co`
    pub url: String,
    /// Public API key (safe to expose in browser)
    pub anon_key: String,
    /// Service-role key (server-side only)
    pub service_key: SecretString,
    /// Storage bucket holding product and slide images
    pub storage_bucket: String,
    /// OAuth providers offered on the login page
    pub oauth_providers: Vec<String>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &self.anon_key)
            .field("service_key", &"[REDACTED]")
            .field("storage_bucket", &self.storage_bucket)
            .field("oauth_providers", &self.oauth_providers)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("APOTHECARY_DATABASE_URL")?;
        let host = parse_env("APOTHECARY_HOST", "127.0.0.1")?;
        let port = parse_env("APOTHECARY_PORT", "3000")?;
        let base_url = get_required_env("APOTHECARY_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let session_secret = get_validated_secret("APOTHECARY_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "APOTHECARY_SESSION_SECRET")?;

        let backend = BackendConfig::from_env()?;
        let profile_fetch_timeout =
            Duration::from_millis(parse_env("PROFILE_FETCH_TIMEOUT_MS", "5000")?);
        let catalog_cache_ttl = Duration::from_secs(parse_env("CATALOG_CACHE_TTL_SECS", "300")?);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            backend,
            profile_fetch_timeout,
            catalog_cache_ttl,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = get_required_env("BACKEND_URL")?;
        url::Url::parse(&url)
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_URL".to_string(), e.to_string()))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: get_required_env("BACKEND_ANON_KEY")?,
            service_key: get_validated_secret("BACKEND_SERVICE_KEY")?,
            storage_bucket: get_env_or_default("BACKEND_STORAGE_BUCKET", "product-images"),
            oauth_providers: parse_provider_list(&get_env_or_default("OAUTH_PROVIDERS", "google")),
        })
    }

    /// Host of the backend, used to allow storage images in the CSP.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }
}

/// Split a comma separated provider list, dropping blanks and duplicates.
fn parse_provider_list(raw: &str) -> Vec<String> {
    let mut providers: Vec<String> = Vec::new();
    for name in raw.split(',').map(|p| p.trim().to_lowercase()) {
        if !name.is_empty() && !providers.contains(&name) {
            providers.push(name);
        }
    }
    providers
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
