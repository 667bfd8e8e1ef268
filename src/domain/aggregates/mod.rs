//! Aggregates module
pub mod product;
pub mod order;
pub mod review;
pub mod question;

pub use product::{Product, ProductError, SourcedProduct};
pub use order::{DeletedOrder, NewOrder, Order, OrderDetail, OrderError, OrderLineItem, PurgeCounts, Transition};
pub use review::{Review, ReviewVideo};
pub use question::{Answer, Question};
