//! In-process store. All tables sit behind one mutex, so every trait method
//! is atomic with respect to the others.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{Page, Store, StoreResult};
use crate::domain::aggregates::{
    Answer, DeletedOrder, NewOrder, Order, OrderLineItem, Product, PurgeCounts, Question, Review, ReviewVideo,
    SourcedProduct, Transition,
};
use crate::domain::value_objects::{ModerationStatus, OrderStatus};

#[derive(Default)]
struct Tables {
    users: HashSet<String>,
    products: BTreeMap<String, Product>,
    orders: BTreeMap<String, Order>,
    line_items: Vec<OrderLineItem>,
    reviews: BTreeMap<String, Review>,
    review_videos: BTreeMap<String, ReviewVideo>,
    questions: BTreeMap<String, Question>,
    answers: Vec<Answer>,
    sourced_products: Vec<SourcedProduct>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn add_user(&self, user_id: impl Into<String>) {
        self.tables.lock().await.users.insert(user_id.into());
    }

    pub async fn add_review(&self, review: Review) {
        self.tables.lock().await.reviews.insert(review.id.clone(), review);
    }

    pub async fn add_review_video(&self, video: ReviewVideo) {
        self.tables.lock().await.review_videos.insert(video.id.clone(), video);
    }

    pub async fn add_sourced_product(&self, product: SourcedProduct) {
        self.tables.lock().await.sourced_products.push(product);
    }

    pub async fn answers_for(&self, question_id: &str) -> Vec<Answer> {
        let t = self.tables.lock().await;
        t.answers.iter().filter(|a| a.question_id == question_id).cloned().collect()
    }

    pub async fn review(&self, id: &str) -> Option<Review> {
        self.tables.lock().await.reviews.get(id).cloned()
    }

    pub async fn review_video(&self, id: &str) -> Option<ReviewVideo> {
        self.tables.lock().await.review_videos.get(id).cloned()
    }

    pub async fn sourced_product_count(&self) -> usize {
        self.tables.lock().await.sourced_products.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn user_exists(&self, user_id: &str) -> StoreResult<bool> {
        Ok(self.tables.lock().await.users.contains(user_id))
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        self.tables.lock().await.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.tables.lock().await.products.get(id).cloned())
    }

    async fn find_products(&self, ids: &[String]) -> StoreResult<Vec<Product>> {
        let t = self.tables.lock().await;
        Ok(ids.iter().filter_map(|id| t.products.get(id).cloned()).collect())
    }

    async fn insert_order(&self, order: &NewOrder) -> StoreResult<Order> {
        let mut t = self.tables.lock().await;
        let record = order.to_order();
        t.orders.insert(record.id.clone(), record.clone());
        t.line_items.extend(order.items().iter().cloned());
        Ok(record)
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(id).cloned())
    }

    async fn find_order_by_reference(&self, reference: &str) -> StoreResult<Option<Order>> {
        let t = self.tables.lock().await;
        Ok(t.orders.values().find(|o| o.toss_order_id == reference).cloned())
    }

    async fn line_items(&self, order_id: &str) -> StoreResult<Vec<OrderLineItem>> {
        let t = self.tables.lock().await;
        Ok(t.line_items.iter().filter(|i| i.order_id == order_id).cloned().collect())
    }

    async fn list_orders(&self, user_id: Option<&str>, page: Page) -> StoreResult<(Vec<Order>, i64)> {
        let t = self.tables.lock().await;
        let mut orders: Vec<Order> = t.orders.values()
            .filter(|o| user_id.map_or(true, |u| o.user_id == u))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        let total = orders.len() as i64;
        let page_orders = orders.into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok((page_orders, total))
    }

    async fn set_order_status(&self, id: &str, status: OrderStatus) -> StoreResult<Option<Order>> {
        let mut t = self.tables.lock().await;
        Ok(t.orders.get_mut(id).map(|o| {
            o.status = status;
            o.updated_at = Utc::now();
            o.clone()
        }))
    }

    async fn transition_order_status(&self, id: &str, from: OrderStatus, to: OrderStatus) -> StoreResult<Option<Transition>> {
        let mut t = self.tables.lock().await;
        Ok(t.orders.get_mut(id).map(|o| {
            if o.status == from {
                o.status = to;
                o.updated_at = Utc::now();
                Transition::Applied(o.clone())
            } else {
                Transition::Unchanged(o.clone())
            }
        }))
    }

    async fn delete_order_cascade(&self, id: &str) -> StoreResult<Option<DeletedOrder>> {
        let mut t = self.tables.lock().await;
        let Some(order) = t.orders.remove(id) else { return Ok(None) };
        let before = t.line_items.len();
        t.line_items.retain(|i| i.order_id != id);
        let deleted_line_items = (before - t.line_items.len()) as u64;
        Ok(Some(DeletedOrder { order, deleted_line_items }))
    }

    async fn delete_orders_for_user(&self, user_id: &str) -> StoreResult<PurgeCounts> {
        let mut t = self.tables.lock().await;
        let ids: HashSet<String> = t.orders.values().filter(|o| o.user_id == user_id).map(|o| o.id.clone()).collect();
        let before = t.line_items.len();
        t.line_items.retain(|i| !ids.contains(&i.order_id));
        let deleted_line_items = (before - t.line_items.len()) as u64;
        t.orders.retain(|id, _| !ids.contains(id));
        Ok(PurgeCounts { deleted_orders: ids.len() as u64, deleted_line_items })
    }

    async fn list_reviews(&self, status: Option<ModerationStatus>) -> StoreResult<Vec<Review>> {
        let t = self.tables.lock().await;
        let mut reviews: Vec<Review> = t.reviews.values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn set_review_status(&self, id: &str, status: ModerationStatus) -> StoreResult<Option<Review>> {
        let mut t = self.tables.lock().await;
        Ok(t.reviews.get_mut(id).map(|r| {
            r.status = status;
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn list_review_videos(&self, status: Option<ModerationStatus>) -> StoreResult<Vec<ReviewVideo>> {
        let t = self.tables.lock().await;
        let mut videos: Vec<ReviewVideo> = t.review_videos.values()
            .filter(|v| status.map_or(true, |s| v.status == s))
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(videos)
    }

    async fn set_review_video_status(&self, id: &str, status: ModerationStatus) -> StoreResult<Option<ReviewVideo>> {
        let mut t = self.tables.lock().await;
        Ok(t.review_videos.get_mut(id).map(|v| {
            v.status = status;
            v.updated_at = Utc::now();
            v.clone()
        }))
    }

    async fn insert_question(&self, question: &Question) -> StoreResult<()> {
        self.tables.lock().await.questions.insert(question.id.clone(), question.clone());
        Ok(())
    }

    async fn find_question(&self, id: &str) -> StoreResult<Option<Question>> {
        Ok(self.tables.lock().await.questions.get(id).cloned())
    }

    async fn insert_answer(&self, answer: &Answer) -> StoreResult<()> {
        self.tables.lock().await.answers.push(answer.clone());
        Ok(())
    }

    async fn delete_sourced_products(&self, status: Option<&str>) -> StoreResult<u64> {
        let mut t = self.tables.lock().await;
        let before = t.sourced_products.len();
        t.sourced_products.retain(|p| status.is_some_and(|s| p.status != s));
        Ok((before - t.sourced_products.len()) as u64)
    }
}
