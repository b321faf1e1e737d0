// pasar-api/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use pasar_flow::FlowError;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to messages, rendered as the `errors` object of a 422 response.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("The given data was invalid.")]
  Validation(FieldErrors),

  #[error("{0}")]
  Unauthorized(String),

  /// Holds the resource name, e.g. "Order".
  #[error("{0} not found.")]
  NotFound(String),

  /// Business rule violations such as "Insufficient stock".
  #[error("{0}")]
  Domain(String),

  /// The payment gateway failed or answered with an error.
  #[error("Payment gateway error: {0}")]
  Payment(String),

  #[error("Compensation failed: {0}")]
  Compensation(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  pub fn validation(field: &str, message: impl Into<String>) -> Self {
    let mut errors = FieldErrors::new();
    errors.insert(field.to_string(), vec![message.into()]);
    AppError::Validation(errors)
  }

  pub fn not_found(resource: &str) -> Self {
    AppError::NotFound(resource.to_string())
  }

  pub fn domain(message: impl Into<String>) -> Self {
    AppError::Domain(message.into())
  }

  fn envelope_message(&self) -> String {
    match self {
      AppError::Sqlx(_) => "Database operation failed".to_string(),
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) | AppError::Compensation(_) => {
        "An internal error occurred".to_string()
      }
      other => other.to_string(),
    }
  }

  fn envelope_errors(&self) -> serde_json::Value {
    match self {
      AppError::Validation(fields) => json!(fields),
      AppError::NotFound(resource) => {
        let mut errors = serde_json::Map::new();
        errors.insert(resource.to_lowercase(), json!(["Not found"]));
        serde_json::Value::Object(errors)
      }
      AppError::Unauthorized(_) => json!({ "auth": ["Unauthorized"] }),
      _ => json!({}),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Domain(_) => StatusCode::BAD_REQUEST,
      AppError::Payment(_) => StatusCode::BAD_GATEWAY,
      AppError::Compensation(_)
      | AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }
    HttpResponse::build(status).json(json!({
      "status": status.as_u16(),
      "message": self.envelope_message(),
      "errors": self.envelope_errors(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;

  async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
    let resp = err.error_response();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[actix_web::test]
  async fn validation_errors_render_per_field_messages() {
    let (status, body) = body_json(AppError::validation("quantity", "The quantity field is required")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
    assert_eq!(body["message"], "The given data was invalid.");
    assert_eq!(body["errors"]["quantity"][0], "The quantity field is required");
  }

  #[actix_web::test]
  async fn not_found_names_the_resource() {
    let (status, body) = body_json(AppError::not_found("Order")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found.");
    assert_eq!(body["errors"]["order"][0], "Not found");
  }

  #[actix_web::test]
  async fn internal_details_are_not_leaked() {
    let (status, body) = body_json(AppError::Internal("db pool poisoned".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "An internal error occurred");
  }
}
