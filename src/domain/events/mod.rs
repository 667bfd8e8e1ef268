//! Domain events
//!
//! Emitted after a state change has been committed. Delivery is best-effort:
//! the store is the source of truth and a failed publish is only logged.

use serde::Serialize;

use crate::domain::value_objects::{ModerationStatus, Money, OrderStatus};

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Order(OrderEvent),
    Moderation(ModerationEvent),
    Qa(QaEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: String, user_id: String, total: Money },
    StatusChanged { order_id: String, status: OrderStatus },
    Deleted { order_id: String, deleted_line_items: u64 },
    Purged { user_id: String, deleted_orders: u64 },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ModerationEvent {
    ReviewStatusChanged { review_id: String, status: ModerationStatus },
    VideoStatusChanged { video_id: String, status: ModerationStatus },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QaEvent {
    QuestionAsked { question_id: String, product_id: String },
    Answered { question_id: String, answer_id: String },
}

impl DomainEvent {
    pub fn subject(&self) -> String {
        let (family, name) = match self {
            Self::Order(e) => ("orders", match e {
                OrderEvent::Placed { .. } => "placed",
                OrderEvent::StatusChanged { .. } => "status_changed",
                OrderEvent::Deleted { .. } => "deleted",
                OrderEvent::Purged { .. } => "purged",
            }),
            Self::Moderation(e) => ("moderation", match e {
                ModerationEvent::ReviewStatusChanged { .. } => "review_status_changed",
                ModerationEvent::VideoStatusChanged { .. } => "video_status_changed",
            }),
            Self::Qa(e) => ("qa", match e {
                QaEvent::QuestionAsked { .. } => "question_asked",
                QaEvent::Answered { .. } => "answered",
            }),
        };
        format!("shop.{family}.{name}")
    }
}

impl From<OrderEvent> for DomainEvent {
    fn from(e: OrderEvent) -> Self { Self::Order(e) }
}

impl From<ModerationEvent> for DomainEvent {
    fn from(e: ModerationEvent) -> Self { Self::Moderation(e) }
}

impl From<QaEvent> for DomainEvent {
    fn from(e: QaEvent) -> Self { Self::Qa(e) }
}

/// Publishes domain events to NATS when a client is configured.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn disabled() -> Self { Self { nats: None } }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    pub async fn publish(&self, event: impl Into<DomainEvent>) {
        let Some(client) = &self.nats else { return };
        let event = event.into();
        let subject = event.subject();
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(%subject, error = %e, "Failed to encode domain event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
            tracing::warn!(%subject, error = %e, "Failed to publish domain event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subjects() {
        let e: DomainEvent = OrderEvent::StatusChanged { order_id: "O1".into(), status: OrderStatus::Paid }.into();
        assert_eq!(e.subject(), "shop.orders.status_changed");
        let e: DomainEvent = ModerationEvent::VideoStatusChanged { video_id: "V1".into(), status: ModerationStatus::Approved }.into();
        assert_eq!(e.subject(), "shop.moderation.video_status_changed");
    }

    #[test]
    fn test_payload_shape() {
        let e: DomainEvent = OrderEvent::StatusChanged { order_id: "O1".into(), status: OrderStatus::Canceled }.into();
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["event"], "status_changed");
        assert_eq!(json["order_id"], "O1");
        assert_eq!(json["status"], "CANCELED");
    }

    #[tokio::test]
    async fn test_disabled_publisher_is_noop() {
        let publisher = EventPublisher::disabled();
        assert!(!publisher.is_enabled());
        publisher.publish(QaEvent::Answered { question_id: "Q".into(), answer_id: "A".into() }).await;
    }
}
