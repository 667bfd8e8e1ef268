//! Order Aggregate

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Money, OrderStatus};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub total: Money,
    pub toss_order_id: String,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub price: Money,
}

/// An order together with its line items.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub line_items: Vec<OrderLineItem>,
}

/// Outcome of a conditional status write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The row matched the expected status and was rewritten.
    Applied(Order),
    /// The row exists but had already left the expected status.
    Unchanged(Order),
}

impl Transition {
    pub fn order(&self) -> &Order {
        match self { Self::Applied(o) | Self::Unchanged(o) => o }
    }
    pub fn into_order(self) -> Order {
        match self { Self::Applied(o) | Self::Unchanged(o) => o }
    }
    pub fn is_applied(&self) -> bool { matches!(self, Self::Applied(_)) }
}

/// Result of the cascading order delete.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedOrder {
    pub order: Order,
    pub deleted_line_items: u64,
}

/// Counts reported by bulk purges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeCounts {
    pub deleted_orders: u64,
    pub deleted_line_items: u64,
}

/// Checkout draft: an order that has not been persisted yet.
#[derive(Clone, Debug)]
pub struct NewOrder {
    id: String,
    user_id: String,
    toss_order_id: String,
    shipping_address: Option<String>,
    items: Vec<OrderLineItem>,
    total: Money,
    created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn create(user_id: impl Into<String>, shipping_address: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            toss_order_id: payment_reference(now),
            shipping_address,
            items: vec![],
            total: Money::zero(),
            created_at: now,
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn user_id(&self) -> &str { &self.user_id }
    pub fn toss_order_id(&self) -> &str { &self.toss_order_id }
    pub fn shipping_address(&self) -> Option<&str> { self.shipping_address.as_deref() }
    pub fn items(&self) -> &[OrderLineItem] { &self.items }
    pub fn total(&self) -> Money { self.total }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Add a line priced from the catalog record.
    pub fn add_item(&mut self, product: &Product, quantity: i32) -> Result<(), OrderError> {
        let qty = u32::try_from(quantity).ok().filter(|q| *q > 0).ok_or(OrderError::InvalidQuantity(quantity))?;
        let line_total = product.price.checked_multiply(qty).ok_or(OrderError::TotalOverflow)?;
        self.total = self.total.checked_add(line_total).ok_or(OrderError::TotalOverflow)?;
        self.items.push(OrderLineItem {
            id: Uuid::now_v7().to_string(),
            order_id: self.id.clone(),
            product_id: product.id.clone(),
            quantity,
            price: product.price,
        });
        Ok(())
    }

    /// The record as it looks right after insertion.
    pub fn to_order(&self) -> Order {
        Order {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            status: OrderStatus::Pending,
            total: self.total,
            toss_order_id: self.toss_order_id.clone(),
            shipping_address: self.shipping_address.clone(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Payment provider order reference: `order_<millis>_<13 lowercase alnum>`.
fn payment_reference(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(13)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("order_{}_{}", now.timestamp_millis(), suffix)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Order has no items")]
    NoItems,
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i32),
    #[error("Order total overflows")]
    TotalOverflow,
}
