// pasar-api/src/pipelines/notification_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::lifecycle::{self, Transition, UnchangedReason};
use crate::pipelines::common_steps::{expect_set, run_compensations_step};
use crate::pipelines::compensation::Compensation;
use crate::pipelines::contexts::NotificationCtxData;
use chrono::Utc;
use pasar_flow::{ContextData, FlowResult, Flows, Pipeline, PipelineControl, StepKind};
use tracing::{info, instrument, warn};

/// Lost compare-and-set races tolerated before giving up. A pending order can
/// only move to a terminal status, so one re-read normally settles it.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

pub fn register_notification_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  let mut p = Pipeline::<NotificationCtxData, AppError>::new(&[
    ("decode_notification", StepKind::Required, None),
    ("load_order_by_reference", StepKind::Required, None),
    ("apply_transition", StepKind::Required, None),
    ("run_compensations", StepKind::BestEffort, None),
  ]);

  p.on_root("decode_notification", decode_notification)?;
  p.on_root("load_order_by_reference", load_order_by_reference)?;
  p.on_root("apply_transition", apply_transition)?;
  p.on_root("run_compensations", run_compensations_step)?;

  flows.register_pipeline(p);
  info!("Payment notification pipeline registered.");
  Ok(())
}

#[instrument(name = "notification::decode", skip_all, err(Display))]
async fn decode_notification(ctx_data: ContextData<NotificationCtxData>) -> AppResult<PipelineControl> {
  let (state, raw) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.raw.clone())
  };
  let notification = state.gateway.decode_notification(&raw).await?;
  info!(
    reference = %notification.reference,
    transaction_status = ?notification.transaction_status,
    fraud_status = ?notification.fraud_status,
    "Payment notification verified."
  );
  ctx_data.write().notification = Some(notification);
  Ok(PipelineControl::Continue)
}

async fn load_order_by_reference(ctx_data: ContextData<NotificationCtxData>) -> AppResult<PipelineControl> {
  let (state, notification) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.notification.clone())
  };
  let notification = expect_set(notification, "notification")?;
  let order = state
    .orders
    .find_by_reference(&notification.reference)
    .await?
    .ok_or_else(|| {
      warn!(reference = %notification.reference, "Notification for an unknown order.");
      AppError::not_found("Order")
    })?;
  ctx_data.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "notification::apply_transition", skip_all, err(Display))]
async fn apply_transition(ctx_data: ContextData<NotificationCtxData>) -> AppResult<PipelineControl> {
  let (state, notification, order) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.notification.clone(), guard.order.clone())
  };
  let notification = expect_set(notification, "notification")?;
  let mut order = expect_set(order, "order")?;

  for _ in 0..MAX_TRANSITION_ATTEMPTS {
    let transition = lifecycle::on_notification(order.status, &notification);
    match transition {
      Transition::CancelRemote => {
        info!(order_id = order.id, "Order already cancelled locally; cancelling the remote transaction.");
        let mut guard = ctx_data.write();
        guard.compensations.push(Compensation::CancelRemoteSession {
          reference: order.order_reference.clone(),
        });
        guard.order = Some(order);
        guard.applied = Some(transition);
        return Ok(PipelineControl::Continue);
      }
      Transition::Unchanged(reason) => {
        match reason {
          UnchangedReason::Terminal => {
            warn!(order_id = order.id, status = %order.status, "Notification for a settled order ignored.")
          }
          UnchangedReason::Unrecognized => warn!(
            order_id = order.id,
            transaction_status = ?notification.transaction_status,
            fraud_status = ?notification.fraud_status,
            "Unrecognized gateway status; order left unchanged."
          ),
          UnchangedReason::StillPending => {
            info!(order_id = order.id, "Payment still pending.")
          }
        }
        let mut guard = ctx_data.write();
        guard.order = Some(order);
        guard.applied = Some(transition);
        return Ok(PipelineControl::Continue);
      }
      Transition::Move { to, return_stock } => {
        let paid_at = transition.paid_at(Utc::now());
        match state.orders.transition_status(order.id, order.status, to, paid_at).await? {
          Some(updated) => {
            info!(order_id = updated.id, from = %order.status, to = %updated.status, "Order status reconciled.");
            let mut guard = ctx_data.write();
            if return_stock {
              guard.compensations.push(Compensation::ReturnStock {
                order_id: updated.id,
                product_id: updated.product_id,
                quantity: updated.quantity,
              });
            }
            guard.order = Some(updated);
            guard.applied = Some(transition);
            return Ok(PipelineControl::Continue);
          }
          None => {
            warn!(order_id = order.id, "Order changed concurrently; re-reading.");
            order = state
              .orders
              .find_by_id(order.id)
              .await?
              .ok_or_else(|| AppError::not_found("Order"))?;
          }
        }
      }
    }
  }

  Err(AppError::Internal(format!(
    "Order {} kept changing while a notification was applied",
    order.id
  )))
}
