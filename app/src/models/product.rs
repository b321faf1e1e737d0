// pasar-api/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: i64,
  /// The seller.
  pub user_id: i64,
  pub name: String,
  pub price: i64,
  pub stock: i32,
  pub image: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
  pub fn is_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }
}

/// Result of looking a product up for a new order.
#[derive(Debug, Clone)]
pub enum ProductLookup {
  Active(Product),
  SoftDeleted,
  Missing,
}
