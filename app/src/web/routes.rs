// pasar-api/src/web/routes.rs

use actix_web::{error, web, HttpResponse, ResponseError};

use crate::errors::AppError;
use crate::web::handlers::{order_handlers, review_handlers, webhook_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

fn invalid_request(field: &str, message: String) -> HttpResponse {
  AppError::validation(field, message).error_response()
}

/// Bodies that fail to parse answer with the validation envelope.
pub fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, _req| {
    let message = match &err {
      error::JsonPayloadError::ContentType => "The request body must be JSON".to_string(),
      other => format!("The request body is invalid: {}", other),
    };
    let response = invalid_request("body", message);
    error::InternalError::from_response(err, response).into()
  })
}

/// Same for query strings, e.g. a non-numeric `page`.
pub fn query_config() -> web::QueryConfig {
  web::QueryConfig::default().error_handler(|err, _req| {
    let response = invalid_request("query", format!("The query string is invalid: {}", err));
    error::InternalError::from_response(err, response).into()
  })
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route(
            "/notification",
            web::post().to(webhook_handlers::payment_notification_handler),
          )
          .route("/history", web::get().to(order_handlers::transaction_history_handler))
          .route("/{id}/cancel", web::post().to(order_handlers::cancel_order_handler))
          .route("/{id}/reviews", web::post().to(review_handlers::create_review_handler)),
      ),
  );
}
