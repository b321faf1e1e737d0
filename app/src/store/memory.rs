// pasar-api/src/store/memory.rs

//! In-process store for local runs (`STORE_BACKEND=memory`) and tests.
//!
//! One mutex guards all tables, so each trait method is atomic in the same way
//! the Postgres transactions are.

use super::{OrderStore, ProductStore, ReviewStore, StockReturn, ALREADY_REVIEWED, INSUFFICIENT_STOCK};
use crate::errors::{AppError, Result};
use crate::models::{
  NewOrder, NewReview, Order, OrderHistoryEntry, OrderStatus, Product, ProductLookup, Review, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
struct Tables {
  users: BTreeMap<i64, User>,
  products: BTreeMap<i64, Product>,
  orders: BTreeMap<i64, Order>,
  reviews: BTreeMap<i64, Review>,
  /// Orders whose stock went back already.
  stock_returns: HashSet<i64>,
  last_id: i64,
}

impl Tables {
  fn next_id(&mut self) -> i64 {
    self.last_id += 1;
    self.last_id
  }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert_user(&self, username: &str) -> User {
    let mut tables = self.tables.lock();
    let user = User {
      id: tables.next_id(),
      username: username.to_string(),
      created_at: Utc::now(),
    };
    tables.users.insert(user.id, user.clone());
    user
  }

  pub fn insert_product(&self, seller_id: i64, name: &str, price: i64, stock: i32) -> Product {
    let mut tables = self.tables.lock();
    let now = Utc::now();
    let product = Product {
      id: tables.next_id(),
      user_id: seller_id,
      name: name.to_string(),
      price,
      stock,
      image: Some(format!("https://cdn.pasar.test/products/{}.jpg", name.to_lowercase().replace(' ', "-"))),
      created_at: now,
      updated_at: now,
      deleted_at: None,
    };
    tables.products.insert(product.id, product.clone());
    product
  }

  pub fn soft_delete_product(&self, product_id: i64) {
    if let Some(product) = self.tables.lock().products.get_mut(&product_id) {
      product.deleted_at = Some(Utc::now());
    }
  }

  pub fn set_stock(&self, product_id: i64, stock: i32) {
    if let Some(product) = self.tables.lock().products.get_mut(&product_id) {
      product.stock = stock;
    }
  }

  pub fn product(&self, product_id: i64) -> Option<Product> {
    self.tables.lock().products.get(&product_id).cloned()
  }

  pub fn order(&self, order_id: i64) -> Option<Order> {
    self.tables.lock().orders.get(&order_id).cloned()
  }

  pub fn order_count(&self) -> usize {
    self.tables.lock().orders.len()
  }

  /// Moves an order's payment due time, e.g. into the past.
  pub fn set_payment_due(&self, order_id: i64, payment_due: DateTime<Utc>) {
    if let Some(order) = self.tables.lock().orders.get_mut(&order_id) {
      order.payment_due = payment_due;
    }
  }

  /// Seeds a seller with two products and returns the demo buyer.
  pub fn seed_demo_data(&self) -> User {
    let seller = self.insert_user("kopi-nusantara");
    self.insert_product(seller.id, "Kopi Gayo 250g", 100_000, 5);
    self.insert_product(seller.id, "Teh Tarik Sachet", 25_000, 40);
    let buyer = self.insert_user("demo-buyer");
    debug!(buyer_id = buyer.id, "In-memory demo data seeded.");
    buyer
  }
}

#[async_trait]
impl ProductStore for MemoryStore {
  async fn find_active_by_id(&self, product_id: i64) -> Result<ProductLookup> {
    Ok(match self.tables.lock().products.get(&product_id) {
      Some(p) if p.is_deleted() => ProductLookup::SoftDeleted,
      Some(p) => ProductLookup::Active(p.clone()),
      None => ProductLookup::Missing,
    })
  }

  async fn return_stock(&self, order_id: i64, product_id: i64, quantity: i32) -> Result<StockReturn> {
    let mut tables = self.tables.lock();
    if tables.stock_returns.contains(&order_id) {
      return Ok(StockReturn::AlreadyApplied);
    }
    let Some(product) = tables.products.get_mut(&product_id).filter(|p| !p.is_deleted()) else {
      return Ok(StockReturn::ProductGone);
    };
    product.stock = product
      .stock
      .checked_add(quantity)
      .ok_or_else(|| AppError::Internal(format!("Stock overflow on product {}", product_id)))?;
    product.updated_at = Utc::now();
    tables.stock_returns.insert(order_id);
    Ok(StockReturn::Applied)
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn create_reserving_stock(&self, new_order: NewOrder) -> Result<Order> {
    let mut tables = self.tables.lock();
    let Some(product) = tables.products.get_mut(&new_order.product_id).filter(|p| !p.is_deleted()) else {
      warn!(reference = %new_order.order_reference, "Product gone before stock could be reserved.");
      return Err(AppError::not_found("Product"));
    };
    if product.stock < new_order.quantity {
      warn!(reference = %new_order.order_reference, "Stock reservation failed; nothing persisted.");
      return Err(AppError::domain(INSUFFICIENT_STOCK));
    }
    product.stock -= new_order.quantity;
    product.updated_at = Utc::now();

    let now = Utc::now();
    let order = Order {
      id: tables.next_id(),
      order_reference: new_order.order_reference,
      user_id: new_order.user_id,
      product_id: new_order.product_id,
      quantity: new_order.quantity,
      total_amount: new_order.total_amount,
      product_name: new_order.product_name,
      product_price: new_order.product_price,
      product_image: new_order.product_image,
      payment_token: new_order.payment_token,
      redirect_url: new_order.redirect_url,
      payment_due: new_order.payment_due,
      paid_at: None,
      status: OrderStatus::Pending,
      created_at: now,
      updated_at: now,
    };
    tables.orders.insert(order.id, order.clone());
    Ok(order)
  }

  async fn find_by_id(&self, order_id: i64) -> Result<Option<Order>> {
    Ok(self.tables.lock().orders.get(&order_id).cloned())
  }

  async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>> {
    Ok(
      self
        .tables
        .lock()
        .orders
        .values()
        .find(|o| o.order_reference == reference)
        .cloned(),
    )
  }

  async fn transition_status(
    &self,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    paid_at: Option<DateTime<Utc>>,
  ) -> Result<Option<Order>> {
    let mut tables = self.tables.lock();
    let Some(order) = tables.orders.get_mut(&order_id).filter(|o| o.status == from) else {
      return Ok(None);
    };
    order.status = to;
    if paid_at.is_some() {
      order.paid_at = paid_at;
    }
    order.updated_at = Utc::now();
    Ok(Some(order.clone()))
  }

  async fn list_by_user(&self, user_id: i64, limit: i64, offset: i64) -> Result<(Vec<OrderHistoryEntry>, i64)> {
    let tables = self.tables.lock();
    let mut orders: Vec<&Order> = tables.orders.values().filter(|o| o.user_id == user_id).collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let total = orders.len() as i64;

    let skip = usize::try_from(offset).unwrap_or(usize::MAX);
    let take = usize::try_from(limit).unwrap_or(0);
    let mut entries = Vec::with_capacity(take.min(orders.len()));
    for order in orders.into_iter().skip(skip).take(take) {
      let product = tables
        .products
        .get(&order.product_id)
        .ok_or_else(|| AppError::Internal(format!("Order {} references a missing product", order.id)))?;
      let store_name = tables
        .users
        .get(&product.user_id)
        .map(|u| u.username.clone())
        .ok_or_else(|| AppError::Internal(format!("Product {} references a missing seller", product.id)))?;
      let review_id = tables.reviews.values().find(|r| r.order_id == order.id).map(|r| r.id);
      entries.push(OrderHistoryEntry {
        order: order.clone(),
        store_id: product.user_id,
        store_name,
        review_id,
      });
    }
    Ok((entries, total))
  }
}

#[async_trait]
impl ReviewStore for MemoryStore {
  async fn find_by_order(&self, order_id: i64) -> Result<Option<Review>> {
    Ok(self.tables.lock().reviews.values().find(|r| r.order_id == order_id).cloned())
  }

  async fn create(&self, new_review: NewReview) -> Result<Review> {
    let mut tables = self.tables.lock();
    if tables.reviews.values().any(|r| r.order_id == new_review.order_id) {
      return Err(AppError::domain(ALREADY_REVIEWED));
    }
    let review = Review {
      id: tables.next_id(),
      order_id: new_review.order_id,
      user_id: new_review.user_id,
      rating: new_review.rating,
      comment: new_review.comment,
      created_at: Utc::now(),
    };
    tables.reviews.insert(review.id, review.clone());
    Ok(review)
  }
}
