// pasar-api/src/pipelines/common_steps.rs

//! Steps and helpers shared by several pipelines.

use crate::errors::{AppError, FieldErrors, Result as AppResult};
use crate::pipelines::compensation;
use crate::pipelines::contexts::CompensatingCtx;
use pasar_flow::{ContextData, PipelineControl};
use serde_json::Value;
use tracing::{debug, instrument};

/// Drains the context's compensation queue and runs it.
///
/// Registered on a `StepKind::BestEffort` step, so a failure here is logged by
/// the engine and the caller still gets the committed result.
#[instrument(name = "common_step::run_compensations", skip_all, err(Display))]
pub async fn run_compensations_step<T: CompensatingCtx>(ctx_data: ContextData<T>) -> AppResult<PipelineControl> {
  let (state, queue) = {
    let mut guard = ctx_data.write();
    let queue = std::mem::take(guard.compensations_mut());
    (guard.app_state().clone(), queue)
  };
  if queue.is_empty() {
    debug!("No compensations queued.");
    return Ok(PipelineControl::Continue);
  }
  compensation::run_compensations(&state, queue).await?;
  Ok(PipelineControl::Continue)
}

/// A value an earlier step should have put in the context.
pub fn expect_set<T>(value: Option<T>, what: &str) -> AppResult<T> {
  value.ok_or_else(|| AppError::Internal(format!("{} missing from pipeline context", what)))
}

/// Reads a required positive integer field, recording a message in `errors`
/// when it is absent, zero, negative, fractional or not a number.
pub fn positive_integer_field(errors: &mut FieldErrors, field: &str, value: Option<&Value>) -> Option<i64> {
  let present = value.filter(|v| !v.is_null() && v.as_f64() != Some(0.0) && v.as_str() != Some(""));
  let Some(value) = present else {
    errors.insert(field.to_string(), vec![format!("The {} field is required", field)]);
    return None;
  };
  let parsed = value.as_i64().or_else(|| {
    value
      .as_f64()
      .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
      .map(|f| f as i64)
  });
  match parsed {
    Some(n) if n > 0 => Some(n),
    _ => {
      errors.insert(field.to_string(), vec![format!("The {} field must be a positive number", field)]);
      None
    }
  }
}
