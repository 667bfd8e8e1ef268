//! Operations behind the HTTP surface. Each service owns a handle to the
//! shared store and the event publisher.

pub mod catalog;
pub mod maintenance;
pub mod moderation;
pub mod orders;
pub mod qa;

pub use catalog::Catalog;
pub use maintenance::Maintenance;
pub use moderation::Moderation;
pub use orders::{CheckoutLine, OrderLifecycle, OrderPage};
pub use qa::QaDesk;
