//! Unified error handling with Sentry integration.
//!
//! Store-backed services degrade to empty values instead of failing, so
//! `AppError` mostly carries request problems (missing pages, bad forms) and
//! failures of the hosted identity and storage APIs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{IdentityError, StorageError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Identity provider call failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Object storage call failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_)
                | Self::Session(_)
                | Self::Identity(IdentityError::Http(_) | IdentityError::Parse(_))
                | Self::Storage(StorageError::Http(_) | StorageError::Api { .. })
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Identity(err) => match err {
                IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                IdentityError::EmailTaken => StatusCode::CONFLICT,
                IdentityError::Api { status: 422, .. } => StatusCode::UNPROCESSABLE_ENTITY,
                IdentityError::Api { status: 429, .. } => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Storage(err) => match err {
                StorageError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                StorageError::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                StorageError::Empty => StatusCode::BAD_REQUEST,
                StorageError::Http(_) | StorageError::Api { .. } => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Session(_) => "Internal server error".to_string(),
            Self::Identity(err) => err.user_message().to_string(),
            Self::Storage(StorageError::Http(_) | StorageError::Api { .. }) => {
                "Image upload failed".to_string()
            }
            Self::Storage(err) => err.to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Handed off to payment page", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_identity_and_storage_status_codes() {
        assert_eq!(
            get_status(IdentityError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(IdentityError::EmailTaken.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                IdentityError::Api {
                    status: 500,
                    message: "boom".to_string()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(StorageError::TooLarge(10).into()),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            get_status(StorageError::UnsupportedType("text/plain".to_string()).into()),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }
}
