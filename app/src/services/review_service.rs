// pasar-api/src/services/review_service.rs

use crate::errors::Result as AppResult;
use crate::models::Review;
use crate::pipelines::common_steps::expect_set;
use crate::pipelines::contexts::ReviewCtxData;
use crate::services::order_service::ensure_completed;
use crate::state::AppState;
use pasar_flow::ContextData;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
  #[serde(default)]
  pub rating: Option<Value>,
  #[serde(default)]
  pub comment: Option<Value>,
}

impl CreateReviewInput {
  pub fn new(rating: i64, comment: &str) -> Self {
    Self {
      rating: Some(Value::from(rating)),
      comment: Some(Value::from(comment)),
    }
  }
}

/// Records the buyer's review of a paid order. One review per order.
#[instrument(name = "review_service::create_review", skip(state, input), err(Display))]
pub async fn create_review(
  state: &AppState,
  user_id: i64,
  order_id: i64,
  input: CreateReviewInput,
) -> AppResult<Review> {
  let ctx_data = ContextData::new(ReviewCtxData::new(state.clone(), user_id, order_id, input));
  let result = state.flows.run(ctx_data.clone()).await?;
  ensure_completed(result, "create_review")?;

  let review = expect_set(ctx_data.write().review.take(), "review")?;
  info!(review_id = review.id, "Review stored.");
  Ok(review)
}
