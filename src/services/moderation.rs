//! Review and review-video moderation.
//!
//! Two independent instances of the same overwrite pattern. A video's status
//! is never derived from, or propagated to, its parent review.

use std::sync::Arc;

use crate::auth::Admin;
use crate::domain::aggregates::{Review, ReviewVideo};
use crate::domain::events::{EventPublisher, ModerationEvent};
use crate::domain::value_objects::ModerationStatus;
use crate::error::{Result, ShopError};
use crate::store::Store;

#[derive(Clone)]
pub struct Moderation {
    store: Arc<dyn Store>,
    events: EventPublisher,
}

impl Moderation {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self { Self { store, events } }

    /// Moderation queue for reviews, newest first.
    pub async fn list_reviews(&self, _: &Admin, status: Option<&str>) -> Result<Vec<Review>> {
        let status = status.map(str::parse::<ModerationStatus>).transpose()?;
        Ok(self.store.list_reviews(status).await?)
    }

    /// Moderation queue for review videos, newest first.
    pub async fn list_review_videos(&self, _: &Admin, status: Option<&str>) -> Result<Vec<ReviewVideo>> {
        let status = status.map(str::parse::<ModerationStatus>).transpose()?;
        Ok(self.store.list_review_videos(status).await?)
    }

    pub async fn set_review_status(&self, admin: &Admin, review_id: &str, status: &str) -> Result<Review> {
        let status: ModerationStatus = status.parse()?;
        let review = self.store.set_review_status(review_id, status).await?
            .ok_or_else(|| ShopError::not_found("Review"))?;

        tracing::info!(review_id, %status, admin_id = admin.id(), "Review moderated");
        self.events.publish(ModerationEvent::ReviewStatusChanged { review_id: review.id.clone(), status }).await;
        Ok(review)
    }

    pub async fn set_review_video_status(&self, admin: &Admin, video_id: &str, status: &str) -> Result<ReviewVideo> {
        let status: ModerationStatus = status.parse()?;
        let video = self.store.set_review_video_status(video_id, status).await?
            .ok_or_else(|| ShopError::not_found("Review video"))?;

        tracing::info!(video_id, %status, admin_id = admin.id(), "Review video moderated");
        self.events.publish(ModerationEvent::VideoStatusChanged { video_id: video.id.clone(), status }).await;
        Ok(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Caller, Identity};
    use crate::store::MemoryStore;
    use chrono::Utc;

    async fn setup() -> (Arc<MemoryStore>, Moderation, Admin) {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.add_review(Review {
            id: "R1".into(), user_id: "U1".into(), product_id: "P1".into(), rating: 5,
            content: "좋아요".into(), status: ModerationStatus::Pending, created_at: now, updated_at: now,
        }).await;
        store.add_review_video(ReviewVideo {
            id: "V1".into(), review_id: "R1".into(), url: "/videos/v1.mp4".into(),
            status: ModerationStatus::Pending, created_at: now, updated_at: now,
        }).await;
        let admin = Caller::authenticated(Identity::admin("A1")).require_admin().unwrap();
        (store.clone(), Moderation::new(store, EventPublisher::disabled()), admin)
    }

    #[tokio::test]
    async fn test_video_status_does_not_touch_review() {
        let (store, moderation, admin) = setup().await;

        let video = moderation.set_review_video_status(&admin, "V1", "APPROVED").await.unwrap();
        assert_eq!(video.status, ModerationStatus::Approved);
        assert_eq!(store.review("R1").await.unwrap().status, ModerationStatus::Pending);

        moderation.set_review_status(&admin, "R1", "REJECTED").await.unwrap();
        assert_eq!(store.review_video("V1").await.unwrap().status, ModerationStatus::Approved);
    }

    #[tokio::test]
    async fn test_invalid_status_leaves_review_unchanged() {
        let (store, moderation, admin) = setup().await;

        let err = moderation.set_review_status(&admin, "R1", "SPAM").await.unwrap_err();
        assert!(matches!(err, ShopError::InvalidInput(_)));
        let err = moderation.set_review_video_status(&admin, "V1", "").await.unwrap_err();
        assert!(matches!(err, ShopError::InvalidInput(_)));
        assert_eq!(store.review("R1").await.unwrap().status, ModerationStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let (_, moderation, admin) = setup().await;
        assert!(matches!(moderation.set_review_status(&admin, "nope", "APPROVED").await, Err(ShopError::NotFound(_))));
        assert!(matches!(moderation.set_review_video_status(&admin, "nope", "APPROVED").await, Err(ShopError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_video_queue_newest_first_with_filter() {
        let (store, moderation, admin) = setup().await;
        let later = Utc::now() + chrono::Duration::minutes(5);
        store.add_review_video(ReviewVideo {
            id: "V2".into(), review_id: "R1".into(), url: "/videos/v2.mp4".into(),
            status: ModerationStatus::Pending, created_at: later, updated_at: later,
        }).await;
        moderation.set_review_video_status(&admin, "V1", "APPROVED").await.unwrap();

        let all = moderation.list_review_videos(&admin, None).await.unwrap();
        assert_eq!(all.iter().map(|v| v.id.as_str()).collect::<Vec<_>>(), ["V2", "V1"]);

        let pending = moderation.list_review_videos(&admin, Some("PENDING")).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "V2");

        assert!(matches!(moderation.list_review_videos(&admin, Some("pending")).await, Err(ShopError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_review_queue_filters_by_status() {
        let (_, moderation, admin) = setup().await;
        assert_eq!(moderation.list_reviews(&admin, Some("PENDING")).await.unwrap().len(), 1);
        moderation.set_review_status(&admin, "R1", "APPROVED").await.unwrap();
        assert!(moderation.list_reviews(&admin, Some("PENDING")).await.unwrap().is_empty());
        assert_eq!(moderation.list_reviews(&admin, None).await.unwrap()[0].status, ModerationStatus::Approved);
    }
}
