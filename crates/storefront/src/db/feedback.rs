//! Feedback widget store.

use async_trait::async_trait;

use super::{PgStore, RepositoryError};
use crate::models::{Feedback, NewFeedback};

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn create_feedback(&self, input: &NewFeedback) -> Result<Feedback, RepositoryError>;
}

#[async_trait]
impl FeedbackStore for PgStore {
    async fn create_feedback(&self, input: &NewFeedback) -> Result<Feedback, RepositoryError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            "INSERT INTO apothecary.feedback (rating, message, email, page) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, rating, message, email, page, created_at",
        )
        .bind(input.rating)
        .bind(input.message.trim())
        .bind(&input.email)
        .bind(&input.page)
        .fetch_one(&self.pool)
        .await?;
        Ok(feedback)
    }
}
