//! Product questions and admin answers.

use std::sync::Arc;

use crate::auth::{Admin, Caller};
use crate::domain::aggregates::{Answer, Question};
use crate::domain::events::{EventPublisher, QaEvent};
use crate::error::{Result, ShopError};
use crate::store::Store;

#[derive(Clone)]
pub struct QaDesk {
    store: Arc<dyn Store>,
    events: EventPublisher,
}

impl QaDesk {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self { Self { store, events } }

    pub async fn create_question(&self, caller: &Caller, product_id: &str, text: &str) -> Result<Question> {
        let identity = caller.require_identity()?;
        let (product_id, text) = (product_id.trim(), text.trim());
        if product_id.is_empty() || text.is_empty() {
            return Err(ShopError::InvalidInput("Product ID and question text are required".into()));
        }
        if self.store.find_product(product_id).await?.is_none() {
            return Err(ShopError::not_found("Product"));
        }

        let question = Question::ask(product_id, identity.user_id.clone(), text);
        self.store.insert_question(&question).await?;
        tracing::info!(question_id = %question.id, product_id, "Question created");
        self.events.publish(QaEvent::QuestionAsked {
            question_id: question.id.clone(),
            product_id: question.product_id.clone(),
        }).await;
        Ok(question)
    }

    /// Single-shot answer creation, authored by the calling admin.
    pub async fn create_answer(&self, admin: &Admin, question_id: &str, text: &str) -> Result<Answer> {
        let (question_id, text) = (question_id.trim(), text.trim());
        if question_id.is_empty() || text.is_empty() {
            return Err(ShopError::InvalidInput("Question ID and answer text are required".into()));
        }
        if self.store.find_question(question_id).await?.is_none() {
            return Err(ShopError::not_found("Question"));
        }

        let answer = Answer::reply(question_id, admin.id(), text);
        self.store.insert_answer(&answer).await?;
        tracing::info!(answer_id = %answer.id, question_id, "Answer created");
        self.events.publish(QaEvent::Answered {
            question_id: answer.question_id.clone(),
            answer_id: answer.id.clone(),
        }).await;
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::domain::aggregates::Product;
    use crate::domain::value_objects::{ModerationStatus, Money};
    use crate::store::MemoryStore;

    async fn setup() -> (Arc<MemoryStore>, QaDesk, String) {
        let store = Arc::new(MemoryStore::new());
        let product = Product::create("텀블러", Money::won(15_000)).unwrap();
        store.insert_product(&product).await.unwrap();
        (store.clone(), QaDesk::new(store, EventPublisher::disabled()), product.id)
    }

    #[tokio::test]
    async fn test_question_then_answer() {
        let (store, qa, product_id) = setup().await;
        let user = Caller::authenticated(Identity::user("U1"));
        let question = qa.create_question(&user, &product_id, "재입고 언제 되나요?").await.unwrap();
        assert_eq!(question.status, ModerationStatus::Pending);
        assert_eq!(question.user_id, "U1");

        let admin = Caller::authenticated(Identity::admin("A1")).require_admin().unwrap();
        let answer = qa.create_answer(&admin, &question.id, "다음 주 입고 예정입니다.").await.unwrap();
        assert_eq!(answer.user_id, "A1");
        assert_eq!(store.answers_for(&question.id).await, vec![answer]);
    }

    #[tokio::test]
    async fn test_answer_validation() {
        let (_, qa, _) = setup().await;
        let admin = Caller::authenticated(Identity::admin("A1")).require_admin().unwrap();

        assert!(matches!(qa.create_answer(&admin, "", "text").await, Err(ShopError::InvalidInput(_))));
        assert!(matches!(qa.create_answer(&admin, "Q1", "   ").await, Err(ShopError::InvalidInput(_))));
        assert!(matches!(qa.create_answer(&admin, "missing", "text").await, Err(ShopError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_anonymous_cannot_ask() {
        let (_, qa, product_id) = setup().await;
        let err = qa.create_question(&Caller::anonymous(), &product_id, "hello").await.unwrap_err();
        assert!(matches!(err, ShopError::Forbidden(_)));
    }
}
