// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use pasar_api::config::AppConfig;
use pasar_api::errors::{AppError, Result as AppResult};
use pasar_api::models::{Order, Product, ProductLookup, User};
use pasar_api::services::order_service::{self, CreateOrderInput};
use pasar_api::services::payment::MockPaymentGateway;
use pasar_api::state::AppState;
use pasar_api::store::{MemoryStore, ProductStore, StockReturn};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;

pub const JWT_SECRET: &str = "test-secret";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn test_config() -> AppConfig {
  let vars: HashMap<&str, &str> = HashMap::from([
    ("STORE_BACKEND", "memory"),
    ("PAYMENT_PROVIDER", "mock"),
    ("JWT_SECRET", JWT_SECRET),
    ("COMPENSATION_BACKOFF_MS", "1"),
  ]);
  AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).expect("test config")
}

/// A wired application over the in-memory store and mock gateway, seeded with
/// one seller, one buyer and a product priced 100000 with 5 in stock.
pub struct TestApp {
  pub state: AppState,
  pub store: Arc<MemoryStore>,
  pub gateway: Arc<MockPaymentGateway>,
  pub seller: User,
  pub buyer: User,
  pub product: Product,
}

impl TestApp {
  pub fn new() -> Self {
    Self::with_gateway(MockPaymentGateway::new())
  }

  pub fn with_gateway(gateway: MockPaymentGateway) -> Self {
    Self::build(gateway, |store| store as Arc<dyn ProductStore>)
  }

  /// Swaps the product store the pipelines see, e.g. for one whose stock
  /// returns fail. Orders and reviews still go to the memory store.
  pub fn with_product_store(wrap: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn ProductStore>) -> Self {
    Self::build(MockPaymentGateway::new(), wrap)
  }

  fn build(gateway: MockPaymentGateway, wrap: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn ProductStore>) -> Self {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(gateway);
    let state = AppState::new(
      Arc::new(test_config()),
      wrap(store.clone()),
      store.clone(),
      store.clone(),
      gateway.clone(),
    )
    .expect("app state");

    let seller = store.insert_user("toko-kopi");
    let buyer = store.insert_user("pembeli");
    let product = store.insert_product(seller.id, "Kopi Gayo 250g", 100_000, 5);
    Self {
      state,
      store,
      gateway,
      seller,
      buyer,
      product,
    }
  }

  pub fn stock(&self) -> i32 {
    self.store.product(self.product.id).expect("product").stock
  }

  pub async fn place_order(&self, quantity: i64) -> Order {
    order_service::create_order(&self.state, self.buyer.id, CreateOrderInput::new(self.product.id, quantity))
      .await
      .expect("order created")
  }

  pub async fn notify(&self, order: &Order, transaction_status: &str, fraud_status: Option<&str>) -> pasar_api::errors::Result<Order> {
    let mut raw = json!({
      "order_id": order.order_reference,
      "transaction_status": transaction_status,
    });
    if let Some(fraud) = fraud_status {
      raw["fraud_status"] = json!(fraud);
    }
    order_service::handle_notification(&self.state, raw).await
  }
}

/// Reads products from the memory store but fails every stock return.
pub struct FailingStockReturns {
  inner: Arc<MemoryStore>,
  attempts: Arc<AtomicUsize>,
}

impl FailingStockReturns {
  pub fn new(inner: Arc<MemoryStore>, attempts: Arc<AtomicUsize>) -> Self {
    Self { inner, attempts }
  }
}

#[async_trait]
impl ProductStore for FailingStockReturns {
  async fn find_active_by_id(&self, product_id: i64) -> AppResult<ProductLookup> {
    self.inner.find_active_by_id(product_id).await
  }

  async fn return_stock(&self, order_id: i64, _product_id: i64, _quantity: i32) -> AppResult<StockReturn> {
    self.attempts.fetch_add(1, Ordering::SeqCst);
    Err(AppError::Internal(format!("stock table locked for order {}", order_id)))
  }
}
