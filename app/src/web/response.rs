// pasar-api/src/web/response.rs

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;

/// Success envelope: `{status, message, data}`.
pub fn success<T: Serialize>(status: StatusCode, message: &str, data: T) -> HttpResponse {
  HttpResponse::build(status).json(json!({
    "status": status.as_u16(),
    "message": message,
    "data": data,
  }))
}

pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
  success(StatusCode::OK, message, data)
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
  success(StatusCode::CREATED, message, data)
}
