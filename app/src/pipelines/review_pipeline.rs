// pasar-api/src/pipelines/review_pipeline.rs

use crate::errors::{AppError, FieldErrors, Result as AppResult};
use crate::models::{NewReview, OrderStatus};
use crate::pipelines::common_steps::{expect_set, positive_integer_field};
use crate::pipelines::contexts::ReviewCtxData;
use crate::store::ALREADY_REVIEWED;
use pasar_flow::{ContextData, FlowResult, Flows, Pipeline, PipelineControl, StepKind};
use serde_json::Value;
use tracing::{info, instrument, warn};

pub fn register_review_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  let mut p = Pipeline::<ReviewCtxData, AppError>::new(&[
    ("validate_review_input", StepKind::Required, None),
    ("load_paid_order", StepKind::Required, None),
    ("authorize_reviewer", StepKind::Required, None),
    ("ensure_not_reviewed", StepKind::Required, None),
    ("persist_review", StepKind::Required, None),
  ]);

  p.on_root("validate_review_input", validate_review_input)?;
  p.on_root("load_paid_order", load_paid_order)?;
  p.on_root("authorize_reviewer", |ctx_data: ContextData<ReviewCtxData>| async move {
    let guard = ctx_data.read();
    let order = expect_set(guard.order.as_ref(), "order")?;
    if order.user_id != guard.user_id {
      warn!(order_id = order.id, user_id = guard.user_id, "Review attempted by someone other than the buyer.");
      return Err(AppError::Unauthorized(
        "You are not authorized to review this order".to_string(),
      ));
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  })?;
  p.on_root("ensure_not_reviewed", ensure_not_reviewed)?;
  p.on_root("persist_review", persist_review)?;

  flows.register_pipeline(p);
  info!("Review pipeline registered.");
  Ok(())
}

async fn validate_review_input(ctx_data: ContextData<ReviewCtxData>) -> AppResult<PipelineControl> {
  let input = ctx_data.read().input.clone();

  let mut errors = FieldErrors::new();
  let rating = positive_integer_field(&mut errors, "rating", input.rating.as_ref());
  let rating = match rating {
    Some(r @ 1..=5) => Some(r as i16),
    Some(_) => {
      errors.insert("rating".to_string(), vec!["The rating field must be between 1 and 5".to_string()]);
      None
    }
    None => None,
  };
  let comment = match input.comment.as_ref() {
    None | Some(Value::Null) => None,
    Some(Value::String(text)) => Some(text.trim()).filter(|c| !c.is_empty()),
    Some(_) => {
      errors.insert("comment".to_string(), vec!["The comment field must be a string".to_string()]);
      None
    }
  };
  if comment.is_none() && !errors.contains_key("comment") {
    errors.insert("comment".to_string(), vec!["The comment field is required".to_string()]);
  }
  if !errors.is_empty() {
    return Err(AppError::Validation(errors));
  }

  let comment = comment.map(str::to_string);
  let mut guard = ctx_data.write();
  guard.rating = rating;
  guard.comment = comment;
  Ok(PipelineControl::Continue)
}

/// Only paid orders can be reviewed; anything else reads as not found.
async fn load_paid_order(ctx_data: ContextData<ReviewCtxData>) -> AppResult<PipelineControl> {
  let (state, order_id) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.order_id)
  };
  let order = state
    .orders
    .find_by_id(order_id)
    .await?
    .filter(|o| o.status == OrderStatus::Paid)
    .ok_or_else(|| AppError::not_found("Order"))?;
  ctx_data.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn ensure_not_reviewed(ctx_data: ContextData<ReviewCtxData>) -> AppResult<PipelineControl> {
  let (state, order_id) = {
    let guard = ctx_data.read();
    (guard.app_state.clone(), guard.order_id)
  };
  if state.reviews.find_by_order(order_id).await?.is_some() {
    return Err(AppError::domain(ALREADY_REVIEWED));
  }
  Ok(PipelineControl::Continue)
}

#[instrument(name = "review::persist", skip_all, err(Display))]
async fn persist_review(ctx_data: ContextData<ReviewCtxData>) -> AppResult<PipelineControl> {
  let (state, new_review) = {
    let guard = ctx_data.read();
    let new_review = NewReview {
      order_id: guard.order_id,
      user_id: guard.user_id,
      rating: expect_set(guard.rating, "rating")?,
      comment: expect_set(guard.comment.clone(), "comment")?,
    };
    (guard.app_state.clone(), new_review)
  };
  let review = state.reviews.create(new_review).await?;
  info!(review_id = review.id, order_id = review.order_id, "Review created.");
  ctx_data.write().review = Some(review);
  Ok(PipelineControl::Continue)
}
