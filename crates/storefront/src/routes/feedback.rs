//! Feedback widget handler.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::middleware::OptionalAuth;
use crate::models::NewFeedback;
use crate::routes::forms::non_empty;
use crate::state::AppState;

/// Feedback widget submission.
#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    pub rating: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

/// Response for form submission.
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FeedbackResponse {
    fn failed(message: &str) -> Json<Self> {
        Json(Self {
            success: false,
            message: Some(message.to_string()),
        })
    }
}

/// Store a feedback submission.
///
/// Signed-in users without an explicit email are recorded with their account
/// email.
#[instrument(skip_all, fields(rating = form.rating))]
pub async fn submit(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Json(form): Json<FeedbackForm>,
) -> impl IntoResponse {
    let input = NewFeedback {
        rating: form.rating,
        message: form.message.trim().to_string(),
        email: non_empty(form.email).or_else(|| user.map(|u| u.email)),
        page: non_empty(form.page),
    };

    if let Some(reason) = input.validation_error() {
        return (StatusCode::BAD_REQUEST, FeedbackResponse::failed(reason));
    }

    match state.feedback().submit(&input).await {
        Some(_) => (
            StatusCode::OK,
            Json(FeedbackResponse {
                success: true,
                message: Some("Thanks for your feedback!".to_string()),
            }),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            FeedbackResponse::failed("Something went wrong. Please try again."),
        ),
    }
}
