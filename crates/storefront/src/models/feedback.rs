//! Feedback widget submissions.

use chrono::{DateTime, Utc};

use apothecary_core::FeedbackId;

/// Longest accepted feedback message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// A stored feedback entry.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Feedback {
    pub id: FeedbackId,
    pub rating: i32,
    pub message: String,
    pub email: Option<String>,
    pub page: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Widget input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub rating: i32,
    pub message: String,
    pub email: Option<String>,
    /// Path the widget was opened on.
    pub page: Option<String>,
}

impl NewFeedback {
    /// First validation failure, if any.
    #[must_use]
    pub fn validation_error(&self) -> Option<&'static str> {
        if !(1..=5).contains(&self.rating) {
            return Some("rating must be between 1 and 5");
        }
        if self.message.chars().count() > MAX_MESSAGE_CHARS {
            return Some("message is too long");
        }
        if let Some(email) = self.email.as_deref()
            && apothecary_core::Email::parse(email).is_err()
        {
            return Some("email is invalid");
        }
        None
    }
}
