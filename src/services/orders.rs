//! Order lifecycle.
//!
//! ```text
//! PENDING ──pay──▶ PAID ──▶ SHIPPED ──▶ DELIVERED
//!    │ ╲
//!    │  ╲──payment failure──▶ CANCELED
//!    └──customer/admin cancel──▶ CANCELLED
//! ```
//!
//! Administrators may overwrite the status with any value of
//! [`OrderStatus::ADMIN_SETTABLE`]; no transition table is enforced on that
//! path. Payment callbacks and customer cancellation are conditional on the
//! order still being PENDING, so a late failure callback can never clobber a
//! completed payment. A success callback must carry the shared callback
//! secret and the exact order total; it addresses the order by the payment
//! reference the provider was given at checkout.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::auth::{Admin, Caller, SignedCallback};
use crate::domain::aggregates::{DeletedOrder, NewOrder, Order, OrderDetail, OrderError, Transition};
use crate::domain::events::{EventPublisher, OrderEvent};
use crate::domain::value_objects::{Money, OrderStatus, Role};
use crate::error::{Result, ShopError};
use crate::store::{Page, Store};

/// One requested checkout line.
#[derive(Clone, Debug)]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: i32,
}

/// A page of orders as returned by [`OrderLifecycle::list_orders`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Clone)]
pub struct OrderLifecycle {
    store: Arc<dyn Store>,
    events: EventPublisher,
}

impl OrderLifecycle {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self { Self { store, events } }

    /// Admin overwrite of the order status.
    pub async fn update_status(&self, admin: &Admin, order_id: &str, status: &str) -> Result<Order> {
        let status = OrderStatus::parse_admin(status)?;
        let order = self.store.set_order_status(order_id, status).await?
            .ok_or_else(|| ShopError::not_found("Order"))?;

        tracing::info!(order_id, %status, admin_id = admin.id(), "Order status updated by admin");
        self.events.publish(OrderEvent::StatusChanged { order_id: order.id.clone(), status }).await;
        Ok(order)
    }

    /// Payment-failure callback: PENDING → CANCELED, otherwise a no-op.
    pub async fn mark_failed_payment(&self, order_id: &str) -> Result<Transition> {
        if order_id.trim().is_empty() {
            return Err(ShopError::InvalidInput("Order ID is required".into()));
        }
        self.settle_pending(order_id, OrderStatus::Canceled).await
    }

    /// Payment-success callback, addressed by payment reference:
    /// PENDING → PAID, otherwise a no-op. The confirmed amount must equal
    /// the order total.
    pub async fn mark_paid(&self, _: &SignedCallback, reference: &str, amount: i64) -> Result<Transition> {
        if reference.trim().is_empty() {
            return Err(ShopError::InvalidInput("Order ID is required".into()));
        }
        let order = self.store.find_order_by_reference(reference).await?
            .ok_or_else(|| ShopError::not_found("Order"))?;
        if order.total != Money::won(amount) {
            tracing::warn!(order_id = %order.id, amount, total = %order.total, "Payment amount mismatch");
            return Err(ShopError::InvalidInput(format!(
                "Payment amount {amount} does not match order total {}", order.total.amount()
            )));
        }
        self.settle_pending(&order.id, OrderStatus::Paid).await
    }

    async fn settle_pending(&self, order_id: &str, to: OrderStatus) -> Result<Transition> {
        let transition = self.store.transition_order_status(order_id, OrderStatus::Pending, to).await?
            .ok_or_else(|| ShopError::not_found("Order"))?;

        match &transition {
            Transition::Applied(order) => {
                tracing::info!(order_id, status = %to, "Payment callback applied");
                self.events.publish(OrderEvent::StatusChanged { order_id: order.id.clone(), status: to }).await;
            }
            Transition::Unchanged(order) => {
                tracing::info!(order_id, current = %order.status, requested = %to, "Order no longer pending, callback ignored");
            }
        }
        Ok(transition)
    }

    /// Remove an order and its line items atomically.
    pub async fn delete_order(&self, admin: &Admin, order_id: &str) -> Result<DeletedOrder> {
        let deleted = self.store.delete_order_cascade(order_id).await?
            .ok_or_else(|| ShopError::not_found("Order"))?;

        tracing::info!(order_id, line_items = deleted.deleted_line_items, admin_id = admin.id(), "Order deleted");
        self.events.publish(OrderEvent::Deleted {
            order_id: deleted.order.id.clone(),
            deleted_line_items: deleted.deleted_line_items,
        }).await;
        Ok(deleted)
    }

    /// Checkout: create a PENDING order priced from the catalog.
    pub async fn place_order(&self, caller: &Caller, lines: &[CheckoutLine], shipping_address: Option<String>) -> Result<OrderDetail> {
        let identity = caller.require_identity()?;
        if lines.is_empty() {
            return Err(OrderError::NoItems.into());
        }
        if !self.store.user_exists(&identity.user_id).await? {
            return Err(ShopError::InvalidInput("User not found for order creation".into()));
        }

        let ids: Vec<String> = lines.iter().map(|l| l.product_id.clone()).collect();
        let products: HashMap<String, _> = self.store.find_products(&ids).await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let mut draft = NewOrder::create(identity.user_id.clone(), shipping_address);
        for line in lines {
            let product = products.get(&line.product_id)
                .ok_or_else(|| ShopError::InvalidInput(format!("Unknown product: {}", line.product_id)))?;
            draft.add_item(product, line.quantity)?;
        }

        let order = self.store.insert_order(&draft).await?;
        tracing::info!(order_id = %order.id, user_id = %order.user_id, total = %order.total, "Order placed");
        self.events.publish(OrderEvent::Placed {
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            total: order.total,
        }).await;
        Ok(OrderDetail { order, line_items: draft.items().to_vec() })
    }

    /// Customer (or admin) cancellation, allowed only while PENDING.
    pub async fn cancel_order(&self, caller: &Caller, order_id: &str) -> Result<Order> {
        let order = self.store.find_order(order_id).await?
            .ok_or_else(|| ShopError::not_found("Order"))?;
        caller.require_self_or_role(&order.user_id, Role::Admin)?;

        let transition = self.store
            .transition_order_status(order_id, OrderStatus::Pending, OrderStatus::Cancelled).await?
            .ok_or_else(|| ShopError::not_found("Order"))?;
        match transition {
            Transition::Applied(order) => {
                tracing::info!(order_id, "Order cancelled");
                self.events.publish(OrderEvent::StatusChanged { order_id: order.id.clone(), status: order.status }).await;
                Ok(order)
            }
            Transition::Unchanged(order) => Err(ShopError::InvalidInput(
                format!("Order cannot be cancelled. Current status: {}", order.status),
            )),
        }
    }

    pub async fn get_order(&self, caller: &Caller, order_id: &str) -> Result<OrderDetail> {
        let order = self.store.find_order(order_id).await?
            .ok_or_else(|| ShopError::not_found("Order"))?;
        caller.require_self_or_role(&order.user_id, Role::Admin)?;
        let line_items = self.store.line_items(order_id).await?;
        Ok(OrderDetail { order, line_items })
    }

    /// The caller's own orders, or every order when `all` is set (admin only).
    pub async fn list_orders(&self, caller: &Caller, all: bool, page: Page) -> Result<OrderPage> {
        let owner = if all {
            caller.require_role(Role::Admin)?;
            None
        } else {
            Some(caller.require_identity()?.user_id.as_str())
        };
        let (orders, total) = self.store.list_orders(owner, page).await?;
        Ok(OrderPage { orders, total, page: page.page, limit: page.limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CallbackSecret, Identity};
    use crate::domain::aggregates::Product;
    use crate::store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        orders: OrderLifecycle,
        admin: Admin,
        customer: Caller,
        products: Vec<Product>,
        signed: SignedCallback,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        store.add_user("U1").await;
        store.add_user("U2").await;
        let mut products = vec![];
        for (name, price) in [("스마트폰", 990_000), ("케이스", 15_000)] {
            let p = Product::create(name, Money::won(price)).unwrap();
            store.insert_product(&p).await.unwrap();
            products.push(p);
        }
        Fixture {
            orders: OrderLifecycle::new(store.clone(), EventPublisher::disabled()),
            store,
            admin: Caller::authenticated(Identity::admin("A1")).require_admin().unwrap(),
            customer: Caller::authenticated(Identity::user("U1")),
            products,
            signed: CallbackSecret::new("cb-secret").verify(Some("cb-secret")).unwrap(),
        }
    }

    impl Fixture {
        async fn place_two_line_order(&self) -> Order {
            let lines = vec![
                CheckoutLine { product_id: self.products[0].id.clone(), quantity: 1 },
                CheckoutLine { product_id: self.products[1].id.clone(), quantity: 2 },
            ];
            self.orders.place_order(&self.customer, &lines, Some("서울시 테스트동 123".into())).await.unwrap().order
        }

        async fn confirm(&self, order: &Order) -> Result<Transition> {
            self.orders.mark_paid(&self.signed, &order.toss_order_id, order.total.amount()).await
        }
    }

    #[tokio::test]
    async fn test_place_order_prices_from_catalog() {
        let f = fixture().await;
        let order = f.place_two_line_order().await;
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, Money::won(1_020_000));
        assert_eq!(f.store.line_items(&order.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_then_delete_scenario() {
        let f = fixture().await;
        let order = f.place_two_line_order().await;

        let paid = f.orders.update_status(&f.admin, &order.id, "PAID").await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);

        let deleted = f.orders.delete_order(&f.admin, &order.id).await.unwrap();
        assert_eq!(deleted.deleted_line_items, 2);
        assert!(f.store.line_items(&order.id).await.unwrap().is_empty());
        assert!(f.store.find_order(&order.id).await.unwrap().is_none());

        let err = f.orders.update_status(&f.admin, &order.id, "SHIPPED").await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_orders_are_not_found() {
        let f = fixture().await;
        assert!(matches!(f.orders.update_status(&f.admin, "missing", "PAID").await, Err(ShopError::NotFound(_))));
        assert!(matches!(f.orders.delete_order(&f.admin, "missing").await, Err(ShopError::NotFound(_))));
        assert!(matches!(f.orders.mark_failed_payment("missing").await, Err(ShopError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_status_leaves_order_unchanged() {
        let f = fixture().await;
        let order = f.place_two_line_order().await;
        for bad in ["CANCELED", "paid", "REFUNDED", ""] {
            let err = f.orders.update_status(&f.admin, &order.id, bad).await.unwrap_err();
            assert!(matches!(err, ShopError::InvalidInput(_)), "{bad}");
        }
        assert_eq!(f.store.find_order(&order.id).await.unwrap().unwrap().status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_failed_payment_is_idempotent() {
        let f = fixture().await;
        let order = f.place_two_line_order().await;

        let first = f.orders.mark_failed_payment(&order.id).await.unwrap();
        assert!(first.is_applied());
        assert_eq!(first.order().status, OrderStatus::Canceled);

        let second = f.orders.mark_failed_payment(&order.id).await.unwrap();
        assert!(!second.is_applied());
        assert_eq!(second.order().status, OrderStatus::Canceled);
    }

    #[tokio::test]
    async fn test_failure_never_overwrites_payment() {
        let f = fixture().await;
        let order = f.place_two_line_order().await;

        assert!(f.confirm(&order).await.unwrap().is_applied());
        let late = f.orders.mark_failed_payment(&order.id).await.unwrap();
        assert_eq!(late, Transition::Unchanged(f.store.find_order(&order.id).await.unwrap().unwrap()));
        assert_eq!(late.order().status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_concurrent_callbacks_settle_once() {
        let f = fixture().await;
        let order = f.place_two_line_order().await;

        let (paid, failed) = tokio::join!(f.confirm(&order), f.orders.mark_failed_payment(&order.id));
        let (paid, failed) = (paid.unwrap(), failed.unwrap());
        assert_ne!(paid.is_applied(), failed.is_applied());

        let stored = f.store.find_order(&order.id).await.unwrap().unwrap().status;
        let expected = if paid.is_applied() { OrderStatus::Paid } else { OrderStatus::Canceled };
        assert_eq!(stored, expected);
    }

    #[tokio::test]
    async fn test_paid_requires_matching_amount() {
        let f = fixture().await;
        let order = f.place_two_line_order().await;

        let err = f.orders.mark_paid(&f.signed, &order.toss_order_id, 1_000).await.unwrap_err();
        assert!(matches!(err, ShopError::InvalidInput(_)));
        assert_eq!(f.store.find_order(&order.id).await.unwrap().unwrap().status, OrderStatus::Pending);

        let paid = f.orders.mark_paid(&f.signed, &order.toss_order_id, 1_020_000).await.unwrap();
        assert!(paid.is_applied());
        assert_eq!(paid.order().status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_paid_resolves_by_payment_reference() {
        let f = fixture().await;
        let order = f.place_two_line_order().await;

        let by_id = f.orders.mark_paid(&f.signed, &order.id, order.total.amount()).await;
        assert!(matches!(by_id, Err(ShopError::NotFound(_))));
        assert!(matches!(f.orders.mark_paid(&f.signed, "", 0).await, Err(ShopError::InvalidInput(_))));

        assert!(f.confirm(&order).await.unwrap().is_applied());
        assert!(!f.confirm(&order).await.unwrap().is_applied());
    }

    #[tokio::test]
    async fn test_empty_order_id_is_invalid() {
        let f = fixture().await;
        assert!(matches!(f.orders.mark_failed_payment(" ").await, Err(ShopError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_customer_cancel_rules() {
        let f = fixture().await;
        let order = f.place_two_line_order().await;

        let stranger = Caller::authenticated(Identity::user("U2"));
        assert!(matches!(f.orders.cancel_order(&stranger, &order.id).await, Err(ShopError::Forbidden(_))));

        let cancelled = f.orders.cancel_order(&f.customer, &order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let err = f.orders.cancel_order(&f.customer, &order.id).await.unwrap_err();
        assert!(matches!(err, ShopError::InvalidInput(m) if m.contains("CANCELLED")));
    }

    #[tokio::test]
    async fn test_unknown_product_creates_nothing() {
        let f = fixture().await;
        let lines = vec![
            CheckoutLine { product_id: f.products[0].id.clone(), quantity: 1 },
            CheckoutLine { product_id: "ghost".into(), quantity: 1 },
        ];
        let err = f.orders.place_order(&f.customer, &lines, None).await.unwrap_err();
        assert!(matches!(err, ShopError::InvalidInput(_)));

        let page = f.orders.list_orders(&f.customer, false, Page::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_checkout_requires_known_user_and_items() {
        let f = fixture().await;
        let ghost = Caller::authenticated(Identity::user("nobody"));
        let lines = vec![CheckoutLine { product_id: f.products[0].id.clone(), quantity: 1 }];
        assert!(matches!(f.orders.place_order(&ghost, &lines, None).await, Err(ShopError::InvalidInput(_))));
        assert!(matches!(f.orders.place_order(&f.customer, &[], None).await, Err(ShopError::InvalidInput(_))));
        assert!(matches!(f.orders.place_order(&Caller::anonymous(), &lines, None).await, Err(ShopError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_listing_scopes() {
        let f = fixture().await;
        f.place_two_line_order().await;
        let other = Caller::authenticated(Identity::user("U2"));
        let lines = vec![CheckoutLine { product_id: f.products[1].id.clone(), quantity: 1 }];
        f.orders.place_order(&other, &lines, None).await.unwrap();

        let own = f.orders.list_orders(&f.customer, false, Page::default()).await.unwrap();
        assert_eq!(own.total, 1);
        assert!(own.orders.iter().all(|o| o.user_id == "U1"));

        assert!(matches!(f.orders.list_orders(&f.customer, true, Page::default()).await, Err(ShopError::Forbidden(_))));
        let admin = Caller::authenticated(Identity::admin("A1"));
        assert_eq!(f.orders.list_orders(&admin, true, Page::default()).await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn test_get_order_is_owner_or_admin() {
        let f = fixture().await;
        let order = f.place_two_line_order().await;

        let detail = f.orders.get_order(&f.customer, &order.id).await.unwrap();
        assert_eq!(detail.line_items.len(), 2);
        let stranger = Caller::authenticated(Identity::user("U2"));
        assert!(matches!(f.orders.get_order(&stranger, &order.id).await, Err(ShopError::Forbidden(_))));
    }
}
