//! Admin bulk cleanup.

use std::sync::Arc;

use crate::auth::Admin;
use crate::domain::aggregates::PurgeCounts;
use crate::domain::events::{EventPublisher, OrderEvent};
use crate::error::{Result, ShopError};
use crate::store::Store;

#[derive(Clone)]
pub struct Maintenance {
    store: Arc<dyn Store>,
    events: EventPublisher,
}

impl Maintenance {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self { Self { store, events } }

    /// Delete every order of `user_id` together with its line items.
    pub async fn purge_user_orders(&self, admin: &Admin, user_id: &str) -> Result<PurgeCounts> {
        if user_id.trim().is_empty() {
            return Err(ShopError::InvalidInput("User ID is required".into()));
        }
        let counts = self.store.delete_orders_for_user(user_id).await?;
        tracing::info!(
            user_id,
            orders = counts.deleted_orders,
            line_items = counts.deleted_line_items,
            admin_id = admin.id(),
            "Purged user orders"
        );
        if counts.deleted_orders > 0 {
            self.events.publish(OrderEvent::Purged { user_id: user_id.to_string(), deleted_orders: counts.deleted_orders }).await;
        }
        Ok(counts)
    }

    /// Delete sourced-product staging rows, optionally only those in `status`.
    pub async fn purge_sourced_products(&self, admin: &Admin, status: Option<&str>) -> Result<u64> {
        let status = status.map(str::trim).filter(|s| !s.is_empty());
        let deleted = self.store.delete_sourced_products(status).await?;
        tracing::info!(deleted, status = status.unwrap_or("*"), admin_id = admin.id(), "Purged sourced products");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Caller, Identity};
    use crate::domain::aggregates::SourcedProduct;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_purge_sourced_products_by_status() {
        let store = Arc::new(MemoryStore::new());
        let mut published = SourcedProduct::stage("https://detail.1688.com/offer/2.html", "cup");
        published.status = "PUBLISHED".into();
        store.add_sourced_product(SourcedProduct::stage("https://detail.1688.com/offer/1.html", "mug")).await;
        store.add_sourced_product(published).await;

        let maintenance = Maintenance::new(store.clone(), EventPublisher::disabled());
        let admin = Caller::authenticated(Identity::admin("A1")).require_admin().unwrap();

        assert_eq!(maintenance.purge_sourced_products(&admin, Some("PENDING")).await.unwrap(), 1);
        assert_eq!(store.sourced_product_count().await, 1);
        assert_eq!(maintenance.purge_sourced_products(&admin, None).await.unwrap(), 1);
        assert_eq!(store.sourced_product_count().await, 0);
    }
}
