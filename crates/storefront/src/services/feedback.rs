//! Feedback widget service.

use tracing::instrument;

use super::OrLog;
use crate::db::FeedbackStore;
use crate::models::{Feedback, NewFeedback};

pub struct FeedbackService<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: FeedbackStore + ?Sized> FeedbackService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Store a submission. Returns `None` when it is invalid or the insert fails.
    #[instrument(skip(self, input), fields(rating = input.rating, page = ?input.page))]
    pub async fn submit(&self, input: &NewFeedback) -> Option<Feedback> {
        if let Some(reason) = input.validation_error() {
            tracing::warn!(reason, "Rejected feedback");
            return None;
        }
        self.store
            .create_feedback(input)
            .await
            .or_log("feedback", "create")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fake::FakeStore;

    fn input(rating: i32) -> NewFeedback {
        NewFeedback {
            rating,
            message: "Quick delivery, friendly pharmacist.".to_string(),
            email: None,
            page: Some("/shop".to_string()),
        }
    }

    #[tokio::test]
    async fn test_submit_stores_feedback() {
        let store = FakeStore::default();
        let service = FeedbackService::new(&store);

        let stored = service.submit(&input(5)).await;
        assert_eq!(stored.map(|f| f.rating), Some(5));
        assert_eq!(store.data.lock().await.feedback.len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_rating_rejected() {
        let store = FakeStore::default();
        let service = FeedbackService::new(&store);

        assert!(service.submit(&input(0)).await.is_none());
        assert!(service.submit(&input(6)).await.is_none());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_degrades_on_backend_error() {
        let store = FakeStore::failing();
        let service = FeedbackService::new(&store);

        assert!(service.submit(&input(4)).await.is_none());
    }
}
