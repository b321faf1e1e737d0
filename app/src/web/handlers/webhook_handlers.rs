// pasar-api/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::order_service;
use crate::state::AppState;
use crate::web::response;

/// Payment gateway webhook. Unauthenticated: the gateway adapter verifies
/// the payload itself.
#[instrument(name = "handler::payment_notification", skip_all)]
pub async fn payment_notification_handler(
  app_state: web::Data<AppState>,
  body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
  let order = order_service::handle_notification(app_state.get_ref(), body.into_inner()).await?;
  info!(order_id = order.id, status = %order.status, "Payment notification acknowledged.");
  Ok(response::ok("Payment notification handled successfully", json!({ "order": order })))
}
