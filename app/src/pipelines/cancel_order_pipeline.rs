// pasar-api/src/pipelines/cancel_order_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::lifecycle::{self, Transition};
use crate::models::OrderStatus;
use crate::pipelines::common_steps::{expect_set, run_compensations_step};
use crate::pipelines::compensation::Compensation;
use crate::pipelines::contexts::CancelOrderCtxData;
use pasar_flow::{ContextData, FlowResult, Flows, Pipeline, PipelineControl, StepKind};
use tracing::{info, instrument, warn};

pub fn register_cancel_order_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  let mut p = Pipeline::<CancelOrderCtxData, AppError>::new(&[
    ("load_order", StepKind::Required, None),
    ("authorize_owner", StepKind::Required, None),
    ("mark_canceled", StepKind::Required, None),
    ("run_compensations", StepKind::BestEffort, None),
  ]);

  p.on_root("load_order", load_order)?;
  p.on_root("authorize_owner", |ctx_data: ContextData<CancelOrderCtxData>| async move {
    let guard = ctx_data.read();
    let order = expect_set(guard.order.as_ref(), "order")?;
    if order.user_id != guard.user_id {
      warn!(order_id = order.id, user_id = guard.user_id, "Cancel attempted by someone other than the buyer.");
      return Err(AppError::Unauthorized(
        "You are not authorized to cancel this order".to_string(),
      ));
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  })?;
  p.on_root("mark_canceled", mark_canceled)?;
  p.on_root("run_compensations", run_compensations_step)?;

  flows.register_pipeline(p);
  info!("Cancel-order pipeline registered.");
  Ok(())
}

async fn load_order(ctx_data: ContextData<CancelOrderCtxData>) -> AppResult<PipelineControl> {
  let (state, order_id) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.order_id)
  };
  let order = state
    .orders
    .find_by_id(order_id)
    .await?
    .ok_or_else(|| AppError::not_found("Order"))?;
  ctx_data.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "cancel_order::mark_canceled", skip_all, err(Display))]
async fn mark_canceled(ctx_data: ContextData<CancelOrderCtxData>) -> AppResult<PipelineControl> {
  let (state, order) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.order.clone())
  };
  let order = expect_set(order, "order")?;

  let Transition::Move { to, return_stock } = lifecycle::on_owner_cancel(order.status)? else {
    return Err(AppError::Internal("Owner cancellation must move the order".to_string()));
  };
  // A concurrent notification or expiry may have moved the order since it was loaded.
  let canceled = state
    .orders
    .transition_status(order.id, OrderStatus::Pending, to, None)
    .await?
    .ok_or_else(|| AppError::domain("Only pending orders can be cancelled"))?;
  info!(order_id = canceled.id, "Order cancelled by its buyer.");

  let mut guard = ctx_data.write();
  if return_stock {
    guard.compensations.push(Compensation::ReturnStock {
      order_id: canceled.id,
      product_id: canceled.product_id,
      quantity: canceled.quantity,
    });
  }
  guard.compensations.push(Compensation::CancelRemoteSession {
    reference: canceled.order_reference.clone(),
  });
  guard.order = Some(canceled);
  Ok(PipelineControl::Continue)
}
