//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Product and slide images are served from the hosted storage bucket, so
//! the backend host is the one extra origin allowed in `img-src`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::config::StorefrontConfig;

/// Precomputed header values, shared by every request.
#[derive(Clone)]
pub struct SecurityHeaders {
    csp: Arc<HeaderValue>,
}

impl SecurityHeaders {
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        let policy = content_security_policy(config.backend.host().as_deref());
        let csp = HeaderValue::from_str(&policy).unwrap_or_else(|_| {
            tracing::warn!("Backend host is not a valid header value; images limited to self");
            HeaderValue::from_static(BASE_POLICY_SELF_IMAGES)
        });
        Self { csp: Arc::new(csp) }
    }
}

const BASE_POLICY_SELF_IMAGES: &str = "default-src 'none'; script-src 'self'; \
     style-src 'self'; font-src 'self'; img-src 'self' data:; connect-src 'self'; \
     frame-src 'none'; object-src 'none'; base-uri 'self'; form-action 'self'; \
     frame-ancestors 'none'";

/// Build the CSP. Starts locked down; only images may come from storage.
#[must_use]
pub fn content_security_policy(storage_host: Option<&str>) -> String {
    let img_src = storage_host.map_or_else(
        || "'self' data:".to_string(),
        |host| format!("'self' data: https://{host}"),
    );
    format!(
        "default-src 'none'; \
         script-src 'self'; \
         style-src 'self'; \
         font-src 'self'; \
         img-src {img_src}; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: strict-origin-when-cross-origin` - Payment pages see the origin only
/// - `Content-Security-Policy` - See [`content_security_policy`]
/// - `Permissions-Policy` - Deny sensitive features
/// - `Cache-Control: no-store` - Unless the handler set its own
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
pub async fn security_headers_middleware(
    State(security): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(CONTENT_SECURITY_POLICY, security.csp.as_ref().clone());

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             microphone=(), \
             payment=(), \
             usb=()",
        ),
    );

    headers
        .entry(CACHE_CONTROL)
        .or_insert_with(|| HeaderValue::from_static("no-store, max-age=0"));

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}
