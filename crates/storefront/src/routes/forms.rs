//! Helpers for urlencoded and multipart form fields.

use axum::response::{Redirect, Response};
use rust_decimal::Decimal;
use tower_sessions::Session;

use crate::models::Toast;
use crate::session_state;

/// Trimmed value, or `None` when blank.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// HTML checkboxes are only submitted when ticked.
pub fn checked(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v, "on" | "true" | "1"))
}

/// Parse a money amount, accepting a leading `$`.
pub fn parse_amount(value: &str) -> Option<Decimal> {
    value
        .trim()
        .trim_start_matches('$')
        .parse::<Decimal>()
        .ok()
        .map(|d| d.round_dp(2))
}

/// A same-site path to send the visitor back to, else `fallback`.
pub fn local_path<'a>(candidate: Option<&'a str>, fallback: &'a str) -> &'a str {
    candidate
        .filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
        .unwrap_or(fallback)
}

/// Queue a toast and redirect (post/redirect/get).
pub async fn redirect_with_toast(session: &Session, toast: Toast, to: &str) -> Response {
    session_state::push_toast(session, toast).await;
    axum::response::IntoResponse::into_response(Redirect::to(to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  hi ".to_string())), Some("hi".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_checked() {
        assert!(checked(Some("on")));
        assert!(!checked(None));
        assert!(!checked(Some("off")));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$12.5"), "12.5".parse().ok());
        assert_eq!(parse_amount(" 3.999 "), "4.00".parse().ok());
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_local_path_rejects_offsite() {
        assert_eq!(local_path(Some("/shop?page=2"), "/"), "/shop?page=2");
        assert_eq!(local_path(Some("//evil.test"), "/"), "/");
        assert_eq!(local_path(Some("https://evil.test"), "/"), "/");
        assert_eq!(local_path(None, "/profile"), "/profile");
    }
}
