//! PostgreSQL store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{Page, Store, StoreError, StoreResult};
use crate::domain::aggregates::{
    Answer, DeletedOrder, NewOrder, Order, OrderLineItem, Product, PurgeCounts, Question, Review, ReviewVideo,
    Transition,
};
use crate::domain::value_objects::{ModerationStatus, Money, OrderStatus};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool { &self.pool }
}

#[derive(sqlx::FromRow)]
struct ProductRow { id: String, name: String, price: i64, created_at: DateTime<Utc> }

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self { Product { id: r.id, name: r.name, price: Money::won(r.price), created_at: r.created_at } }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String, user_id: String, status: String, total: i64, toss_order_id: String,
    shipping_address: Option<String>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;
    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status = r.status.parse::<OrderStatus>()
            .map_err(|_| StoreError::DataCorruption(format!("order {} has status {:?}", r.id, r.status)))?;
        Ok(Order {
            id: r.id, user_id: r.user_id, status, total: Money::won(r.total), toss_order_id: r.toss_order_id,
            shipping_address: r.shipping_address, created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineItemRow { id: String, order_id: String, product_id: String, quantity: i32, price: i64 }

impl From<LineItemRow> for OrderLineItem {
    fn from(r: LineItemRow) -> Self {
        OrderLineItem { id: r.id, order_id: r.order_id, product_id: r.product_id, quantity: r.quantity, price: Money::won(r.price) }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: String, user_id: String, product_id: String, rating: i32, content: String, status: String,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;
    fn try_from(r: ReviewRow) -> Result<Self, Self::Error> {
        let status = moderation(&r.status, "review", &r.id)?;
        Ok(Review {
            id: r.id, user_id: r.user_id, product_id: r.product_id, rating: r.rating, content: r.content,
            status, created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewVideoRow { id: String, review_id: String, url: String, status: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc> }

impl TryFrom<ReviewVideoRow> for ReviewVideo {
    type Error = StoreError;
    fn try_from(r: ReviewVideoRow) -> Result<Self, Self::Error> {
        let status = moderation(&r.status, "review video", &r.id)?;
        Ok(ReviewVideo { id: r.id, review_id: r.review_id, url: r.url, status, created_at: r.created_at, updated_at: r.updated_at })
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow { id: String, product_id: String, user_id: String, question_text: String, status: String, created_at: DateTime<Utc> }

impl TryFrom<QuestionRow> for Question {
    type Error = StoreError;
    fn try_from(r: QuestionRow) -> Result<Self, Self::Error> {
        let status = moderation(&r.status, "question", &r.id)?;
        Ok(Question { id: r.id, product_id: r.product_id, user_id: r.user_id, question_text: r.question_text, status, created_at: r.created_at })
    }
}

fn moderation(value: &str, entity: &str, id: &str) -> StoreResult<ModerationStatus> {
    value.parse().map_err(|_| StoreError::DataCorruption(format!("{entity} {id} has status {value:?}")))
}

#[async_trait]
impl Store for PgStore {
    async fn user_exists(&self, user_id: &str) -> StoreResult<bool> {
        let found: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(user_id).fetch_optional(&self.pool).await?;
        Ok(found.is_some())
    }

    async fn insert_product(&self, p: &Product) -> StoreResult<()> {
        sqlx::query("INSERT INTO products (id, name, price, created_at) VALUES ($1, $2, $3, $4)")
            .bind(&p.id).bind(&p.name).bind(p.price.amount()).bind(p.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Product::from))
    }

    async fn find_products(&self, ids: &[String]) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn insert_order(&self, o: &NewOrder) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, OrderRow>("INSERT INTO orders (id, user_id, status, total, toss_order_id, shipping_address, created_at, updated_at) VALUES ($1, $2, 'PENDING', $3, $4, $5, $6, $6) RETURNING *")
            .bind(o.id()).bind(o.user_id()).bind(o.total().amount()).bind(o.toss_order_id()).bind(o.shipping_address()).bind(o.created_at())
            .fetch_one(&mut *tx).await?;
        for item in o.items() {
            sqlx::query("INSERT INTO order_line_items (id, order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4, $5)")
                .bind(&item.id).bind(&item.order_id).bind(&item.product_id).bind(item.quantity).bind(item.price.amount())
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        row.try_into()
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?
            .map(Order::try_from).transpose()
    }

    async fn find_order_by_reference(&self, reference: &str) -> StoreResult<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE toss_order_id = $1")
            .bind(reference).fetch_optional(&self.pool).await?
            .map(Order::try_from).transpose()
    }

    async fn line_items(&self, order_id: &str) -> StoreResult<Vec<OrderLineItem>> {
        let rows = sqlx::query_as::<_, LineItemRow>("SELECT * FROM order_line_items WHERE order_id = $1 ORDER BY id")
            .bind(order_id).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(OrderLineItem::from).collect())
    }

    async fn list_orders(&self, user_id: Option<&str>, page: Page) -> StoreResult<(Vec<Order>, i64)> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE ($1::text IS NULL OR user_id = $1) ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3")
            .bind(user_id).bind(i64::from(page.limit)).bind(page.offset() as i64)
            .fetch_all(&self.pool).await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR user_id = $1)")
            .bind(user_id).fetch_one(&self.pool).await?;
        let orders = rows.into_iter().map(Order::try_from).collect::<StoreResult<Vec<_>>>()?;
        Ok((orders, total.0))
    }

    async fn set_order_status(&self, id: &str, status: OrderStatus) -> StoreResult<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
            .bind(id).bind(status.as_str()).fetch_optional(&self.pool).await?
            .map(Order::try_from).transpose()
    }

    async fn transition_order_status(&self, id: &str, from: OrderStatus, to: OrderStatus) -> StoreResult<Option<Transition>> {
        let updated = sqlx::query_as::<_, OrderRow>("UPDATE orders SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2 RETURNING *")
            .bind(id).bind(from.as_str()).bind(to.as_str())
            .fetch_optional(&self.pool).await?;
        if let Some(row) = updated {
            return Ok(Some(Transition::Applied(row.try_into()?)));
        }
        Ok(self.find_order(id).await?.map(Transition::Unchanged))
    }

    async fn delete_order_cascade(&self, id: &str) -> StoreResult<Option<DeletedOrder>> {
        let mut tx = self.pool.begin().await?;
        let locked = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id).fetch_optional(&mut *tx).await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }
        let items = sqlx::query("DELETE FROM order_line_items WHERE order_id = $1")
            .bind(id).execute(&mut *tx).await?.rows_affected();
        let row = sqlx::query_as::<_, OrderRow>("DELETE FROM orders WHERE id = $1 RETURNING *")
            .bind(id).fetch_one(&mut *tx).await?;
        tx.commit().await?;
        Ok(Some(DeletedOrder { order: row.try_into()?, deleted_line_items: items }))
    }

    async fn delete_orders_for_user(&self, user_id: &str) -> StoreResult<PurgeCounts> {
        let mut tx = self.pool.begin().await?;
        let items = sqlx::query("DELETE FROM order_line_items WHERE order_id IN (SELECT id FROM orders WHERE user_id = $1)")
            .bind(user_id).execute(&mut *tx).await?.rows_affected();
        let orders = sqlx::query("DELETE FROM orders WHERE user_id = $1")
            .bind(user_id).execute(&mut *tx).await?.rows_affected();
        tx.commit().await?;
        Ok(PurgeCounts { deleted_orders: orders, deleted_line_items: items })
    }

    async fn list_reviews(&self, status: Option<ModerationStatus>) -> StoreResult<Vec<Review>> {
        sqlx::query_as::<_, ReviewRow>("SELECT * FROM reviews WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC, id DESC")
            .bind(status.map(|s| s.as_str())).fetch_all(&self.pool).await?
            .into_iter().map(Review::try_from).collect()
    }

    async fn set_review_status(&self, id: &str, status: ModerationStatus) -> StoreResult<Option<Review>> {
        sqlx::query_as::<_, ReviewRow>("UPDATE reviews SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
            .bind(id).bind(status.as_str()).fetch_optional(&self.pool).await?
            .map(Review::try_from).transpose()
    }

    async fn list_review_videos(&self, status: Option<ModerationStatus>) -> StoreResult<Vec<ReviewVideo>> {
        sqlx::query_as::<_, ReviewVideoRow>("SELECT * FROM review_videos WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC, id DESC")
            .bind(status.map(|s| s.as_str())).fetch_all(&self.pool).await?
            .into_iter().map(ReviewVideo::try_from).collect()
    }

    async fn set_review_video_status(&self, id: &str, status: ModerationStatus) -> StoreResult<Option<ReviewVideo>> {
        sqlx::query_as::<_, ReviewVideoRow>("UPDATE review_videos SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
            .bind(id).bind(status.as_str()).fetch_optional(&self.pool).await?
            .map(ReviewVideo::try_from).transpose()
    }

    async fn insert_question(&self, q: &Question) -> StoreResult<()> {
        sqlx::query("INSERT INTO questions (id, product_id, user_id, question_text, status, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(&q.id).bind(&q.product_id).bind(&q.user_id).bind(&q.question_text).bind(q.status.as_str()).bind(q.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn find_question(&self, id: &str) -> StoreResult<Option<Question>> {
        sqlx::query_as::<_, QuestionRow>("SELECT * FROM questions WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?
            .map(Question::try_from).transpose()
    }

    async fn insert_answer(&self, a: &Answer) -> StoreResult<()> {
        sqlx::query("INSERT INTO answers (id, question_id, user_id, answer_text, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(&a.id).bind(&a.question_id).bind(&a.user_id).bind(&a.answer_text).bind(a.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_sourced_products(&self, status: Option<&str>) -> StoreResult<u64> {
        let deleted = sqlx::query("DELETE FROM sourced_products WHERE ($1::text IS NULL OR status = $1)")
            .bind(status).execute(&self.pool).await?.rows_affected();
        Ok(deleted)
    }
}
