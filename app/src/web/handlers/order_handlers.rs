// pasar-api/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::parse_order_id;
use crate::errors::AppError;
use crate::services::order_service::{self, CreateOrderInput};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::response;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
  pub page: Option<i64>,
  pub page_size: Option<i64>,
}

#[instrument(name = "handler::create_order", skip(app_state, body, auth_user), fields(user_id = auth_user.user_id))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  body: web::Json<CreateOrderInput>,
) -> Result<HttpResponse, AppError> {
  let order = order_service::create_order(app_state.get_ref(), auth_user.user_id, body.into_inner()).await?;
  info!(order_id = order.id, "Order creation request served.");
  Ok(response::created("Order created successfully", json!({ "order": order })))
}

#[instrument(name = "handler::cancel_order", skip(app_state, path, auth_user), fields(user_id = auth_user.user_id))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order_id = parse_order_id(&path.into_inner())?;
  let order = order_service::cancel_order(app_state.get_ref(), auth_user.user_id, order_id).await?;
  Ok(response::ok("Order cancelled successfully", json!({ "order": order })))
}

#[instrument(name = "handler::transaction_history", skip(app_state, query, auth_user), fields(user_id = auth_user.user_id))]
pub async fn transaction_history_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
  let HistoryQuery { page, page_size } = query.into_inner();
  let history = order_service::transaction_history(
    app_state.get_ref(),
    auth_user.user_id,
    page.unwrap_or(DEFAULT_PAGE),
    page_size.unwrap_or(DEFAULT_PAGE_SIZE),
  )
  .await?;
  Ok(response::ok("Transaction history retrieved successfully", history))
}
