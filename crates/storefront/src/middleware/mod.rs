//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame and referrer policy)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting (governor, per POST route)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AuthRejection, OptionalAuth, RequireAdmin, RequireAuth};
pub use rate_limit::{auth_rate_limiter, form_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::{SecurityHeaders, security_headers_middleware};
pub use session::{create_session_layer, session_layer};
