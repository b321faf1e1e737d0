// pasar-api/src/pipelines/compensation.rs

//! Side effects that undo part of an order after its status changed.
//!
//! Tasks are queued by the step that wins the status update and run by a
//! best-effort step at the end of the pipeline. Each task is retried on its
//! own; a task that keeps failing is reported, never rolled into the order.

use crate::config::CompensationPolicy;
use crate::errors::{AppError, Result as AppResult};
use crate::state::AppState;
use crate::store::StockReturn;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
  ReturnStock {
    order_id: i64,
    product_id: i64,
    quantity: i32,
  },
  CancelRemoteSession {
    reference: String,
  },
}

impl Compensation {
  fn label(&self) -> String {
    match self {
      Compensation::ReturnStock { order_id, .. } => format!("return stock for order {}", order_id),
      Compensation::CancelRemoteSession { reference } => format!("cancel remote session {}", reference),
    }
  }
}

/// Runs every task in order. Fails with `AppError::Compensation` listing the
/// tasks that still failed after all attempts; the rest are applied anyway.
pub async fn run_compensations(state: &AppState, tasks: Vec<Compensation>) -> AppResult<()> {
  let policy = state.config.compensation;
  let mut failures = Vec::new();
  for task in &tasks {
    if let Err(e) = apply_with_retry(state, task, policy).await {
      error!(task = %task.label(), error = %e, "Compensation gave up.");
      failures.push(format!("{}: {}", task.label(), e));
    }
  }
  if failures.is_empty() {
    Ok(())
  } else {
    Err(AppError::Compensation(failures.join("; ")))
  }
}

async fn apply_with_retry(state: &AppState, task: &Compensation, policy: CompensationPolicy) -> AppResult<()> {
  let mut attempt = 1;
  loop {
    match apply_once(state, task).await {
      Ok(()) => return Ok(()),
      Err(e) if attempt < policy.max_attempts => {
        warn!(task = %task.label(), attempt, error = %e, "Compensation attempt failed; retrying.");
        tokio::time::sleep(policy.backoff * attempt).await;
        attempt += 1;
      }
      Err(e) => return Err(e),
    }
  }
}

async fn apply_once(state: &AppState, task: &Compensation) -> AppResult<()> {
  match task {
    Compensation::ReturnStock {
      order_id,
      product_id,
      quantity,
    } => match state.products.return_stock(*order_id, *product_id, *quantity).await? {
      StockReturn::Applied => {
        info!(order_id, product_id, quantity, "Stock returned.");
        Ok(())
      }
      StockReturn::AlreadyApplied => {
        info!(order_id, "Stock for this order was already returned.");
        Ok(())
      }
      StockReturn::ProductGone => {
        info!(
          "Product with ID {} has been deleted. Stock return skipped for order {}",
          product_id, order_id
        );
        Ok(())
      }
    },
    Compensation::CancelRemoteSession { reference } => {
      state.gateway.cancel_session(reference).await?;
      info!(%reference, "Remote payment session cancelled.");
      Ok(())
    }
  }
}
