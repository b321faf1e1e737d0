// pasar-api/src/store/mod.rs

//! Storage contracts used by the order pipelines.
//!
//! `PgStore` backs production; `MemoryStore` backs local runs and tests.
//! Both keep the same guarantees: the stock decrement is conditional and
//! commits together with the order insert, status updates are
//! compare-and-set, and stock goes back at most once per order.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::models::{NewOrder, NewReview, Order, OrderHistoryEntry, OrderStatus, ProductLookup, Review};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Outcome of giving reserved stock back to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockReturn {
  Applied,
  /// Stock for this order was already returned.
  AlreadyApplied,
  /// Product is soft-deleted or missing; nothing was changed.
  ProductGone,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
  async fn find_active_by_id(&self, product_id: i64) -> Result<ProductLookup>;

  /// Adds `quantity` back to the product's stock on behalf of `order_id`.
  async fn return_stock(&self, order_id: i64, product_id: i64, quantity: i32) -> Result<StockReturn>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Inserts a `PENDING` order and takes its quantity off the product's stock
  /// in one transaction. Persists nothing on failure: NotFound("Product") when
  /// the product is missing or soft-deleted, "Insufficient stock" otherwise.
  async fn create_reserving_stock(&self, new_order: NewOrder) -> Result<Order>;

  async fn find_by_id(&self, order_id: i64) -> Result<Option<Order>>;

  async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>>;

  /// Moves the order from `from` to `to`. Returns `None` when the stored
  /// status is no longer `from`. `paid_at`, when given, is stamped as well.
  async fn transition_status(
    &self,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    paid_at: Option<DateTime<Utc>>,
  ) -> Result<Option<Order>>;

  /// Newest first, plus the buyer's total order count.
  async fn list_by_user(&self, user_id: i64, limit: i64, offset: i64) -> Result<(Vec<OrderHistoryEntry>, i64)>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
  async fn find_by_order(&self, order_id: i64) -> Result<Option<Review>>;

  /// Fails with "You have already reviewed this order" if the order has a review.
  async fn create(&self, new_review: NewReview) -> Result<Review>;
}

pub(crate) const INSUFFICIENT_STOCK: &str = "Insufficient stock";
pub(crate) const ALREADY_REVIEWED: &str = "You have already reviewed this order";
