//! MIGA Shop
//!
//! Storefront and back-office service for a small marketplace seller.
//!
//! ## Features
//! - Order lifecycle: checkout, payment callbacks, admin status updates
//! - Cascading order deletion inside one transaction
//! - Review and review-video moderation
//! - Product Q&A with admin answers
//! - Maintenance purges for test orders and sourced-product staging rows

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{Result, ShopError};
pub use routes::{router, AppState};
