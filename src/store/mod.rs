//! Data store boundary.
//!
//! Every operation goes through [`Store`]. Implementations must make each
//! method atomic on its own: multi-row mutations run in one transaction and
//! conditional status writes are a single compare-and-set.
//!
//! - [`PgStore`]: PostgreSQL via sqlx, used by the server binary
//! - [`MemoryStore`]: in-process tables behind one lock, used by tests

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::aggregates::{
    Answer, DeletedOrder, NewOrder, Order, OrderLineItem, Product, PurgeCounts, Question, Review, ReviewVideo,
    Transition,
};
use crate::domain::value_objects::{ModerationStatus, OrderStatus};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value cannot be mapped back to the domain (e.g. an unknown
    /// status literal).
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One-based page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

impl Default for Page {
    fn default() -> Self { Self::new(None, None) }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn user_exists(&self, user_id: &str) -> StoreResult<bool>;

    // Catalog
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>>;
    async fn find_products(&self, ids: &[String]) -> StoreResult<Vec<Product>>;

    // Orders
    /// Insert the order (PENDING) and all of its line items together.
    async fn insert_order(&self, order: &NewOrder) -> StoreResult<Order>;
    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>>;
    /// Lookup by the payment reference handed to the payment provider.
    async fn find_order_by_reference(&self, reference: &str) -> StoreResult<Option<Order>>;
    async fn line_items(&self, order_id: &str) -> StoreResult<Vec<OrderLineItem>>;
    /// Newest first. `user_id = None` lists every order.
    async fn list_orders(&self, user_id: Option<&str>, page: Page) -> StoreResult<(Vec<Order>, i64)>;
    /// Unconditional write. `None` when the order does not exist.
    async fn set_order_status(&self, id: &str, status: OrderStatus) -> StoreResult<Option<Order>>;
    /// Write `to` only if the stored status is still `from`.
    async fn transition_order_status(&self, id: &str, from: OrderStatus, to: OrderStatus)
        -> StoreResult<Option<Transition>>;
    /// Delete the line items, then the order, in one transaction. `None`
    /// (and nothing deleted) when the order does not exist.
    async fn delete_order_cascade(&self, id: &str) -> StoreResult<Option<DeletedOrder>>;
    async fn delete_orders_for_user(&self, user_id: &str) -> StoreResult<PurgeCounts>;

    // Moderation
    /// Newest first, optionally restricted to one status.
    async fn list_reviews(&self, status: Option<ModerationStatus>) -> StoreResult<Vec<Review>>;
    async fn set_review_status(&self, id: &str, status: ModerationStatus) -> StoreResult<Option<Review>>;
    /// Newest first, optionally restricted to one status.
    async fn list_review_videos(&self, status: Option<ModerationStatus>) -> StoreResult<Vec<ReviewVideo>>;
    async fn set_review_video_status(&self, id: &str, status: ModerationStatus) -> StoreResult<Option<ReviewVideo>>;

    // Q&A
    async fn insert_question(&self, question: &Question) -> StoreResult<()>;
    async fn find_question(&self, id: &str) -> StoreResult<Option<Question>>;
    async fn insert_answer(&self, answer: &Answer) -> StoreResult<()>;

    // Sourcing
    /// Delete staging rows, all of them or only those in `status`.
    async fn delete_sourced_products(&self, status: Option<&str>) -> StoreResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamping() {
        assert_eq!(Page::new(None, None), Page { page: 1, limit: 20 });
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, limit: 1 });
        assert_eq!(Page::new(Some(3), Some(500)), Page { page: 3, limit: 100 });
        assert_eq!(Page::new(Some(3), Some(10)).offset(), 20);
    }
}
