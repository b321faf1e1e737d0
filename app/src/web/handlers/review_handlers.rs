// pasar-api/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use super::parse_order_id;
use crate::errors::AppError;
use crate::services::review_service::{self, CreateReviewInput};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::response;

#[instrument(name = "handler::create_review", skip(app_state, path, body, auth_user), fields(user_id = auth_user.user_id))]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
  body: web::Json<CreateReviewInput>,
) -> Result<HttpResponse, AppError> {
  let order_id = parse_order_id(&path.into_inner())?;
  let review = review_service::create_review(app_state.get_ref(), auth_user.user_id, order_id, body.into_inner()).await?;
  Ok(response::created("Review created successfully", json!({ "review": review })))
}
