// pasar-api/src/models/review.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
  pub id: i64,
  pub order_id: i64,
  pub user_id: i64,
  pub rating: i16,
  pub comment: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
  pub order_id: i64,
  pub user_id: i64,
  pub rating: i16,
  pub comment: String,
}
