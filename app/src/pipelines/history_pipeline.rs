// pasar-api/src/pipelines/history_pipeline.rs

use crate::errors::{AppError, FieldErrors, Result as AppResult};
use crate::lifecycle::{self, Transition};
use crate::models::OrderStatus;
use crate::pipelines::common_steps::run_compensations_step;
use crate::pipelines::compensation::Compensation;
use crate::pipelines::contexts::HistoryCtxData;
use chrono::Utc;
use pasar_flow::{ContextData, FlowResult, Flows, Pipeline, PipelineControl, StepKind};
use tracing::{debug, info, instrument, warn};

pub fn register_history_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  let mut p = Pipeline::<HistoryCtxData, AppError>::new(&[
    ("validate_paging", StepKind::Required, None),
    ("load_history_page", StepKind::Required, None),
    ("expire_overdue_orders", StepKind::Required, None),
    ("run_compensations", StepKind::BestEffort, None),
  ]);

  p.on_root("validate_paging", |ctx_data: ContextData<HistoryCtxData>| async move {
    let (page, page_size) = {
      let guard = ctx_data.read();
      (guard.page, guard.page_size)
    };
    let mut errors = FieldErrors::new();
    if page < 1 {
      errors.insert("page".to_string(), vec!["The page field must be at least 1".to_string()]);
    }
    if page_size < 1 {
      errors.insert(
        "pageSize".to_string(),
        vec!["The pageSize field must be at least 1".to_string()],
      );
    }
    if !errors.is_empty() {
      return Err(AppError::Validation(errors));
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  })?;
  p.on_root("load_history_page", load_history_page)?;
  p.on_root("expire_overdue_orders", expire_overdue_orders)?;
  p.on_root("run_compensations", run_compensations_step)?;

  flows.register_pipeline(p);
  info!("Transaction history pipeline registered.");
  Ok(())
}

#[instrument(name = "history::load_page", skip_all, err(Display))]
async fn load_history_page(ctx_data: ContextData<HistoryCtxData>) -> AppResult<PipelineControl> {
  let (state, user_id, page, page_size) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.user_id, guard.page, guard.page_size)
  };
  let offset = (page - 1)
    .checked_mul(page_size)
    .ok_or_else(|| AppError::validation("page", "The page field is out of range"))?;

  let (entries, total_orders) = state.orders.list_by_user(user_id, page_size, offset).await?;
  debug!(user_id, page, page_size, returned = entries.len(), total_orders, "History page loaded.");

  let mut guard = ctx_data.write();
  guard.entries = entries;
  guard.total_orders = total_orders;
  Ok(PipelineControl::Continue)
}

/// Persists EXPIRED for every overdue pending order on the page and queues
/// its stock return. The page reflects the stored status afterwards.
#[instrument(name = "history::expire_overdue_orders", skip_all, err(Display))]
async fn expire_overdue_orders(ctx_data: ContextData<HistoryCtxData>) -> AppResult<PipelineControl> {
  let (state, mut entries) = {
    let mut guard = ctx_data.write();
    (guard.app_state.clone(), std::mem::take(&mut guard.entries))
  };
  let now = Utc::now();
  let mut queued = Vec::new();

  for entry in entries.iter_mut() {
    let Some(Transition::Move { to, return_stock }) = lifecycle::on_read(&entry.order, now) else {
      continue;
    };
    match state
      .orders
      .transition_status(entry.order.id, OrderStatus::Pending, to, None)
      .await?
    {
      Some(expired) => {
        info!(order_id = expired.id, "Overdue order expired on read.");
        if return_stock {
          queued.push(Compensation::ReturnStock {
            order_id: expired.id,
            product_id: expired.product_id,
            quantity: expired.quantity,
          });
        }
        entry.order = expired;
      }
      None => {
        // Someone else settled it first; show what they stored.
        if let Some(current) = state.orders.find_by_id(entry.order.id).await? {
          warn!(order_id = current.id, status = %current.status, "Order changed before it could be expired.");
          entry.order = current;
        }
      }
    }
  }

  let mut guard = ctx_data.write();
  guard.entries = entries;
  guard.compensations.extend(queued);
  Ok(PipelineControl::Continue)
}
