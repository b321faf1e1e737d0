// pasar-api/src/store/postgres.rs

use super::{OrderStore, ProductStore, ReviewStore, StockReturn, ALREADY_REVIEWED, INSUFFICIENT_STOCK};
use crate::errors::{AppError, Result};
use crate::models::{NewOrder, NewReview, Order, OrderHistoryEntry, OrderStatus, Product, ProductLookup, Review};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info, instrument, warn};

const ORDER_COLUMNS: &str = "id, order_reference, user_id, product_id, quantity, total_amount, product_name, \
  product_price, product_image, payment_token, redirect_url, payment_due, paid_at, status, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, user_id, name, price, stock, image, created_at, updated_at, deleted_at";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn run_migrations(&self) -> Result<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;
    info!("Database migrations applied.");
    Ok(())
  }

  /// Inserts a demo seller with two products unless the seller already exists.
  pub async fn seed_demo_data(&self) -> Result<()> {
    let inserted: Option<(i64,)> =
      sqlx::query_as("INSERT INTO users (username) VALUES ($1) ON CONFLICT (username) DO NOTHING RETURNING id")
        .bind("kopi-nusantara")
        .fetch_optional(&self.pool)
        .await?;
    let Some((seller_id,)) = inserted else {
      info!("Demo data already present, skipping seed.");
      return Ok(());
    };
    for (name, price, stock) in [("Kopi Gayo 250g", 100_000_i64, 5_i32), ("Teh Tarik Sachet", 25_000, 40)] {
      sqlx::query("INSERT INTO products (user_id, name, price, stock) VALUES ($1, $2, $3, $4)")
        .bind(seller_id)
        .bind(name)
        .bind(price)
        .bind(stock)
        .execute(&self.pool)
        .await?;
    }
    sqlx::query("INSERT INTO users (username) VALUES ($1) ON CONFLICT (username) DO NOTHING")
      .bind("demo-buyer")
      .execute(&self.pool)
      .await?;
    info!(seller_id, "Demo data seeded.");
    Ok(())
  }
}

#[async_trait]
impl ProductStore for PgStore {
  #[instrument(name = "pg::find_active_product", skip(self))]
  async fn find_active_by_id(&self, product_id: i64) -> Result<ProductLookup> {
    let product: Option<Product> = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(product_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| {
        error!("Database error while fetching product {}: {}", product_id, e);
        AppError::Sqlx(e)
      })?;
    Ok(match product {
      Some(p) if p.is_deleted() => ProductLookup::SoftDeleted,
      Some(p) => ProductLookup::Active(p),
      None => ProductLookup::Missing,
    })
  }

  #[instrument(name = "pg::return_stock", skip(self))]
  async fn return_stock(&self, order_id: i64, product_id: i64, quantity: i32) -> Result<StockReturn> {
    let mut tx = self.pool.begin().await?;

    let claimed = sqlx::query(
      "INSERT INTO stock_returns (order_id, product_id, quantity) VALUES ($1, $2, $3) ON CONFLICT (order_id) DO NOTHING",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *tx)
    .await?;
    if claimed.rows_affected() == 0 {
      tx.rollback().await?;
      return Ok(StockReturn::AlreadyApplied);
    }

    let updated = sqlx::query(
      "UPDATE products SET stock = stock + $1, updated_at = NOW() WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(quantity)
    .bind(product_id)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
      tx.rollback().await?;
      return Ok(StockReturn::ProductGone);
    }

    tx.commit().await?;
    Ok(StockReturn::Applied)
  }
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(
    name = "pg::create_order",
    skip(self, new_order),
    fields(reference = %new_order.order_reference, product_id = new_order.product_id, quantity = new_order.quantity)
  )]
  async fn create_reserving_stock(&self, new_order: NewOrder) -> Result<Order> {
    let mut tx = self.pool.begin().await?;

    let order: Order = sqlx::query_as(&format!(
      "INSERT INTO orders (order_reference, user_id, product_id, quantity, total_amount, product_name, product_price, \
       product_image, payment_token, redirect_url, payment_due, status) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(&new_order.order_reference)
    .bind(new_order.user_id)
    .bind(new_order.product_id)
    .bind(new_order.quantity)
    .bind(new_order.total_amount)
    .bind(&new_order.product_name)
    .bind(new_order.product_price)
    .bind(&new_order.product_image)
    .bind(&new_order.payment_token)
    .bind(&new_order.redirect_url)
    .bind(new_order.payment_due)
    .bind(OrderStatus::Pending)
    .fetch_one(&mut *tx)
    .await?;

    let reserved = sqlx::query(
      "UPDATE products SET stock = stock - $1, updated_at = NOW() \
       WHERE id = $2 AND deleted_at IS NULL AND stock >= $1",
    )
    .bind(new_order.quantity)
    .bind(new_order.product_id)
    .execute(&mut *tx)
    .await?;
    if reserved.rows_affected() == 0 {
      let active: Option<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1 AND deleted_at IS NULL")
        .bind(new_order.product_id)
        .fetch_optional(&mut *tx)
        .await?;
      tx.rollback().await?;
      if active.is_none() {
        warn!("Product gone before stock could be reserved; order insert rolled back.");
        return Err(AppError::not_found("Product"));
      }
      warn!("Stock reservation lost a race; order insert rolled back.");
      return Err(AppError::domain(INSUFFICIENT_STOCK));
    }

    tx.commit().await?;
    info!(order_id = order.id, "Order persisted and stock reserved.");
    Ok(order)
  }

  async fn find_by_id(&self, order_id: i64) -> Result<Option<Order>> {
    let order = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(order)
  }

  async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>> {
    let order = sqlx::query_as(&format!("SELECT {} FROM orders WHERE order_reference = $1", ORDER_COLUMNS))
      .bind(reference)
      .fetch_optional(&self.pool)
      .await?;
    Ok(order)
  }

  #[instrument(name = "pg::transition_status", skip(self))]
  async fn transition_status(
    &self,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    paid_at: Option<DateTime<Utc>>,
  ) -> Result<Option<Order>> {
    let order = sqlx::query_as(&format!(
      "UPDATE orders SET status = $3, paid_at = COALESCE($4, paid_at), updated_at = NOW() \
       WHERE id = $1 AND status = $2 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(from)
    .bind(to)
    .bind(paid_at)
    .fetch_optional(&self.pool)
    .await?;
    Ok(order)
  }

  async fn list_by_user(&self, user_id: i64, limit: i64, offset: i64) -> Result<(Vec<OrderHistoryEntry>, i64)> {
    let order_columns = ORDER_COLUMNS
      .split(", ")
      .map(|c| format!("o.{}", c.trim()))
      .collect::<Vec<_>>()
      .join(", ");
    let entries: Vec<OrderHistoryEntry> = sqlx::query_as(&format!(
      "SELECT {}, p.user_id AS store_id, u.username AS store_name, r.id AS review_id \
       FROM orders o \
       JOIN products p ON p.id = o.product_id \
       JOIN users u ON u.id = p.user_id \
       LEFT JOIN reviews r ON r.order_id = o.id \
       WHERE o.user_id = $1 \
       ORDER BY o.created_at DESC, o.id DESC \
       LIMIT $2 OFFSET $3",
      order_columns
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&self.pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
      .bind(user_id)
      .fetch_one(&self.pool)
      .await?;

    Ok((entries, total))
  }
}

#[async_trait]
impl ReviewStore for PgStore {
  async fn find_by_order(&self, order_id: i64) -> Result<Option<Review>> {
    let review = sqlx::query_as(
      "SELECT id, order_id, user_id, rating, comment, created_at FROM reviews WHERE order_id = $1 ORDER BY id LIMIT 1",
    )
    .bind(order_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(review)
  }

  async fn create(&self, new_review: NewReview) -> Result<Review> {
    let review: Option<Review> = sqlx::query_as(
      "INSERT INTO reviews (order_id, user_id, rating, comment) VALUES ($1, $2, $3, $4) \
       ON CONFLICT (order_id) DO NOTHING \
       RETURNING id, order_id, user_id, rating, comment, created_at",
    )
    .bind(new_review.order_id)
    .bind(new_review.user_id)
    .bind(new_review.rating)
    .bind(&new_review.comment)
    .fetch_optional(&self.pool)
    .await?;
    review.ok_or_else(|| AppError::domain(ALREADY_REVIEWED))
  }
}
