// pasar-api/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A user as far as orders care: buyers and sellers ("stores").
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: i64,
  pub username: String,
  pub created_at: DateTime<Utc>,
}
