//! Catalog and sourcing records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn create(name: impl Into<String>, price: Money) -> Result<Self, ProductError> {
        let name = name.into().trim().to_string();
        if name.is_empty() { return Err(ProductError::MissingName); }
        if price.amount() < 0 { return Err(ProductError::NegativePrice); }
        Ok(Self { id: Uuid::now_v7().to_string(), name, price, created_at: Utc::now() })
    }
}

/// Staging row for a product imported from an external supplier, waiting
/// for translation, pricing and publication to the marketplace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcedProduct {
    pub id: String,
    pub source_url: String,
    pub title: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl SourcedProduct {
    pub fn stage(source_url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            source_url: source_url.into(),
            title: title.into(),
            status: "PENDING".to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("Product name is required")]
    MissingName,
    #[error("Price must not be negative")]
    NegativePrice,
}
