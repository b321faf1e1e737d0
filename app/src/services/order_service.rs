// pasar-api/src/services/order_service.rs

//! Entry points for the order lifecycle. Each operation builds its context,
//! runs the registered pipeline and reads the result back out.

use crate::errors::{AppError, Result as AppResult};
use crate::models::{Order, Pagination, TransactionHistory};
use crate::pipelines::common_steps::expect_set;
use crate::pipelines::contexts::{CancelOrderCtxData, CreateOrderCtxData, HistoryCtxData, NotificationCtxData};
use crate::state::AppState;
use pasar_flow::{ContextData, PipelineResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Request body for creating an order. Fields stay untyped so malformed
/// values come back as field errors instead of a body parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
  #[serde(default)]
  pub product_id: Option<Value>,
  #[serde(default)]
  pub quantity: Option<Value>,
}

impl CreateOrderInput {
  pub fn new(product_id: i64, quantity: i64) -> Self {
    Self {
      product_id: Some(Value::from(product_id)),
      quantity: Some(Value::from(quantity)),
    }
  }
}

/// Every order pipeline finishes by running all its steps; a stop means a
/// handler bailed out without an error, which none of them should do.
pub(crate) fn ensure_completed(result: PipelineResult, operation: &str) -> AppResult<()> {
  match result {
    PipelineResult::Completed => Ok(()),
    PipelineResult::Stopped => {
      warn!(operation, "Pipeline stopped before completing.");
      Err(AppError::Internal(format!("{} did not complete", operation)))
    }
  }
}

#[instrument(name = "order_service::create_order", skip(state, input), err(Display))]
pub async fn create_order(state: &AppState, user_id: i64, input: CreateOrderInput) -> AppResult<Order> {
  let ctx_data = ContextData::new(CreateOrderCtxData::new(state.clone(), user_id, input));
  let result = state.flows.run(ctx_data.clone()).await?;
  ensure_completed(result, "create_order")?;

  let order = expect_set(ctx_data.write().order.take(), "order")?;
  info!(order_id = order.id, reference = %order.order_reference, "Order created.");
  Ok(order)
}

#[instrument(name = "order_service::cancel_order", skip(state), err(Display))]
pub async fn cancel_order(state: &AppState, user_id: i64, order_id: i64) -> AppResult<Order> {
  let ctx_data = ContextData::new(CancelOrderCtxData::new(state.clone(), user_id, order_id));
  let result = state.flows.run(ctx_data.clone()).await?;
  ensure_completed(result, "cancel_order")?;

  let order = ctx_data.write().order.take();
  expect_set(order, "order")
}

/// Reconciles an order with a gateway notification and returns the order as
/// stored afterwards, whether or not its status moved.
#[instrument(name = "order_service::handle_notification", skip_all, err(Display))]
pub async fn handle_notification(state: &AppState, raw: Value) -> AppResult<Order> {
  let ctx_data = ContextData::new(NotificationCtxData::new(state.clone(), raw));
  let result = state.flows.run(ctx_data.clone()).await?;
  ensure_completed(result, "handle_notification")?;

  let order = ctx_data.write().order.take();
  expect_set(order, "order")
}

#[instrument(name = "order_service::transaction_history", skip(state), err(Display))]
pub async fn transaction_history(
  state: &AppState,
  user_id: i64,
  page: i64,
  page_size: i64,
) -> AppResult<TransactionHistory> {
  let ctx_data = ContextData::new(HistoryCtxData::new(state.clone(), user_id, page, page_size));
  let result = state.flows.run(ctx_data.clone()).await?;
  ensure_completed(result, "transaction_history")?;

  let (orders, total_orders) = {
    let mut guard = ctx_data.write();
    (std::mem::take(&mut guard.entries), guard.total_orders)
  };
  Ok(TransactionHistory {
    orders,
    pagination: Pagination::new(page, page_size, total_orders),
  })
}
