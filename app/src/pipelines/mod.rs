// pasar-api/src/pipelines/mod.rs

//! Defines and registers the order lifecycle pipelines.

use crate::errors::{AppError, Result as AppResult};
use pasar_flow::Flows;

pub mod common_steps;
pub mod compensation;
pub mod contexts;

pub mod cancel_order_pipeline;
pub mod create_order_pipeline;
pub mod history_pipeline;
pub mod notification_pipeline;
pub mod review_pipeline;

/// Registers every pipeline with `flows`. Called once per `AppState`.
pub fn register_all_pipelines(flows: &Flows<AppError>) -> AppResult<()> {
  tracing::info!("Registering pipelines...");

  create_order_pipeline::register_create_order_pipeline(flows)?;
  cancel_order_pipeline::register_cancel_order_pipeline(flows)?;
  notification_pipeline::register_notification_pipeline(flows)?;
  history_pipeline::register_history_pipeline(flows)?;
  review_pipeline::register_review_pipeline(flows)?;

  tracing::info!("All application pipelines registered.");
  Ok(())
}
