//! Identity provider error types.

use thiserror::Error;

/// Errors from the hosted identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error status.
    #[error("identity provider error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account already exists for this email.
    #[error("email already registered")]
    EmailTaken,

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl IdentityError {
    /// Message safe to show on the login and register forms.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Incorrect email or password.",
            Self::EmailTaken => "An account with this email already exists.",
            Self::Api { status: 422, .. } => {
                "Please check your details. Passwords need at least 6 characters."
            }
            Self::Api { status: 429, .. } => "Too many attempts. Please wait and try again.",
            Self::Http(_) | Self::Api { .. } | Self::Parse(_) => {
                "Sign-in is unavailable right now. Please try again."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_provider_detail() {
        let err = IdentityError::Api {
            status: 500,
            message: "database connection refused".to_string(),
        };
        assert!(!err.user_message().contains("database"));
        assert_eq!(
            IdentityError::InvalidCredentials.user_message(),
            "Incorrect email or password."
        );
    }
}
