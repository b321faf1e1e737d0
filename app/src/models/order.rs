// pasar-api/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
  Pending,
  Paid,
  Canceled,
  Expired,
}

impl OrderStatus {
  /// Only `Pending` orders may still change status.
  pub fn is_terminal(self) -> bool {
    !matches!(self, OrderStatus::Pending)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Paid => "PAID",
      OrderStatus::Canceled => "CANCELED",
      OrderStatus::Expired => "EXPIRED",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A purchase of one product. Price, name and image are copied from the
/// product when the order is placed.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: i64,
  /// Transaction key shared with the payment gateway.
  pub order_reference: String,
  pub user_id: i64,
  pub product_id: i64,
  pub quantity: i32,
  pub total_amount: i64,
  pub product_name: String,
  pub product_price: i64,
  pub product_image: Option<String>,
  pub payment_token: String,
  pub redirect_url: String,
  pub payment_due: DateTime<Utc>,
  pub paid_at: Option<DateTime<Utc>>,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  /// Pending, unpaid and past its payment due time.
  pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
    self.status == OrderStatus::Pending && self.paid_at.is_none() && self.payment_due < now
  }
}

/// Everything needed to insert a `PENDING` order.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub order_reference: String,
  pub user_id: i64,
  pub product_id: i64,
  pub quantity: i32,
  pub total_amount: i64,
  pub product_name: String,
  pub product_price: i64,
  pub product_image: Option<String>,
  pub payment_token: String,
  pub redirect_url: String,
  pub payment_due: DateTime<Utc>,
}
