// pasar-api/src/pipelines/contexts.rs

//! Data structs the pipelines run over. Handlers receive them wrapped in
//! `pasar_flow::ContextData`.

use crate::lifecycle::{GatewayNotification, Transition};
use crate::models::{Order, OrderHistoryEntry, Product, Review};
use crate::pipelines::compensation::Compensation;
use crate::services::order_service::CreateOrderInput;
use crate::services::payment::PaymentSession;
use crate::services::review_service::CreateReviewInput;
use crate::state::AppState;
use chrono::{DateTime, Utc};

/// Contexts whose pipeline ends with a compensation step.
pub trait CompensatingCtx: Send + Sync + 'static {
  fn app_state(&self) -> &AppState;
  fn compensations_mut(&mut self) -> &mut Vec<Compensation>;
}

macro_rules! compensating_ctx {
  ($($ctx:ty),+ $(,)?) => {
    $(
      impl CompensatingCtx for $ctx {
        fn app_state(&self) -> &AppState {
          &self.app_state
        }

        fn compensations_mut(&mut self) -> &mut Vec<Compensation> {
          &mut self.compensations
        }
      }
    )+
  };
}

compensating_ctx!(CancelOrderCtxData, NotificationCtxData, HistoryCtxData);

/// Price and identity fixed before the gateway is called.
#[derive(Debug, Clone)]
pub struct OrderQuote {
  pub reference: String,
  pub total_amount: i64,
  pub payment_due: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CreateOrderCtxData {
  pub app_state: AppState,
  pub user_id: i64,
  pub input: CreateOrderInput,
  pub product_id: Option<i64>,
  pub quantity: Option<i32>,
  pub product: Option<Product>,
  pub quote: Option<OrderQuote>,
  pub session: Option<PaymentSession>,
  pub order: Option<Order>,
}

impl CreateOrderCtxData {
  pub fn new(app_state: AppState, user_id: i64, input: CreateOrderInput) -> Self {
    Self {
      app_state,
      user_id,
      input,
      product_id: None,
      quantity: None,
      product: None,
      quote: None,
      session: None,
      order: None,
    }
  }
}

#[derive(Clone)]
pub struct CancelOrderCtxData {
  pub app_state: AppState,
  pub user_id: i64,
  pub order_id: i64,
  pub order: Option<Order>,
  pub compensations: Vec<Compensation>,
}

impl CancelOrderCtxData {
  pub fn new(app_state: AppState, user_id: i64, order_id: i64) -> Self {
    Self {
      app_state,
      user_id,
      order_id,
      order: None,
      compensations: Vec::new(),
    }
  }
}

#[derive(Clone)]
pub struct NotificationCtxData {
  pub app_state: AppState,
  pub raw: serde_json::Value,
  pub notification: Option<GatewayNotification>,
  pub order: Option<Order>,
  /// What reconciliation decided, for logging and tests.
  pub applied: Option<Transition>,
  pub compensations: Vec<Compensation>,
}

impl NotificationCtxData {
  pub fn new(app_state: AppState, raw: serde_json::Value) -> Self {
    Self {
      app_state,
      raw,
      notification: None,
      order: None,
      applied: None,
      compensations: Vec::new(),
    }
  }
}

#[derive(Clone)]
pub struct HistoryCtxData {
  pub app_state: AppState,
  pub user_id: i64,
  pub page: i64,
  pub page_size: i64,
  pub entries: Vec<OrderHistoryEntry>,
  pub total_orders: i64,
  pub compensations: Vec<Compensation>,
}

impl HistoryCtxData {
  pub fn new(app_state: AppState, user_id: i64, page: i64, page_size: i64) -> Self {
    Self {
      app_state,
      user_id,
      page,
      page_size,
      entries: Vec::new(),
      total_orders: 0,
      compensations: Vec::new(),
    }
  }
}

#[derive(Clone)]
pub struct ReviewCtxData {
  pub app_state: AppState,
  pub user_id: i64,
  pub order_id: i64,
  pub input: CreateReviewInput,
  pub rating: Option<i16>,
  pub comment: Option<String>,
  pub order: Option<Order>,
  pub review: Option<Review>,
}

impl ReviewCtxData {
  pub fn new(app_state: AppState, user_id: i64, order_id: i64, input: CreateReviewInput) -> Self {
    Self {
      app_state,
      user_id,
      order_id,
      input,
      rating: None,
      comment: None,
      order: None,
      review: None,
    }
  }
}
