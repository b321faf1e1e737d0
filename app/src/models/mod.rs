// pasar-api/src/models/mod.rs

//! Database entities and the shapes returned to clients.

pub mod history;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use history::{OrderHistoryEntry, Pagination, TransactionHistory};
pub use order::{NewOrder, Order, OrderStatus};
pub use product::{Product, ProductLookup};
pub use review::{NewReview, Review};
pub use user::User;
