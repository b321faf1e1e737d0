// pasar-api/src/web/extractors.rs

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::services::auth_service::{bearer_token, verify_token};
use crate::state::AppState;

/// The caller identified by a valid `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: i64,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(authenticate(req))
  }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("Application state is not configured".to_string()))?;

  let token = req
    .headers()
    .get(AUTHORIZATION)
    .and_then(|h| h.to_str().ok())
    .and_then(bearer_token)
    .ok_or_else(|| {
      debug!("Request without a bearer token.");
      AppError::Unauthorized("Unauthorized access.".to_string())
    })?;

  let claims = verify_token(&state.config.jwt_secret, token).map_err(|e| {
    warn!(error = %e, "Bearer token rejected.");
    e
  })?;
  Ok(AuthenticatedUser { user_id: claims.id })
}
