//! Minimal product catalog backing checkout prices.

use std::sync::Arc;

use crate::auth::Admin;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::Money;
use crate::error::{Result, ShopError};
use crate::store::Store;

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn Store>,
}

impl Catalog {
    pub fn new(store: Arc<dyn Store>) -> Self { Self { store } }

    pub async fn create_product(&self, admin: &Admin, name: &str, price: i64) -> Result<Product> {
        let product = Product::create(name, Money::won(price))?;
        self.store.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, admin_id = admin.id(), "Product created");
        Ok(product)
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product> {
        self.store.find_product(product_id).await?.ok_or_else(|| ShopError::not_found("Product"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Caller, Identity};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_create_and_fetch_product() {
        let catalog = Catalog::new(Arc::new(MemoryStore::new()));
        let admin = Caller::authenticated(Identity::admin("A1")).require_admin().unwrap();

        let product = catalog.create_product(&admin, "  텀블러 ", 15_000).await.unwrap();
        assert_eq!(product.name, "텀블러");
        assert_eq!(catalog.get_product(&product.id).await.unwrap(), product);
    }

    #[tokio::test]
    async fn test_rejects_negative_price_and_unknown_id() {
        let catalog = Catalog::new(Arc::new(MemoryStore::new()));
        let admin = Caller::authenticated(Identity::admin("A1")).require_admin().unwrap();

        assert!(matches!(catalog.create_product(&admin, "mug", -1).await, Err(ShopError::InvalidInput(_))));
        assert!(matches!(catalog.get_product("missing").await, Err(ShopError::NotFound(_))));
    }
}
