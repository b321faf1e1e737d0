// pasar-api/src/services/auth_service.rs

//! Bearer token handling. Tokens are HS256 JWTs whose `id` claim is the user id.

use crate::errors::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub id: i64,
  pub exp: i64,
}

/// Issues a token for `user_id` valid for `ttl`.
pub fn issue_token(secret: &str, user_id: i64, ttl: Duration) -> Result<String, AppError> {
  let claims = Claims {
    id: user_id,
    exp: (Utc::now() + ttl).timestamp(),
  };
  encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

#[instrument(name = "auth_service::verify_token", skip_all, err(Display))]
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AppError> {
  let validation = Validation::new(Algorithm::HS256);
  let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation).map_err(|e| {
    debug!(error = %e, "Token rejected.");
    match e.kind() {
      ErrorKind::ExpiredSignature => AppError::Unauthorized("Token has expired.".to_string()),
      _ => AppError::Unauthorized("Invalid token.".to_string()),
    }
  })?;
  Ok(data.claims)
}

/// Strips the `Bearer ` prefix from an `Authorization` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
  header_value
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn issued_tokens_carry_the_user_id() {
    let token = issue_token("secret", 42, Duration::hours(1)).unwrap();
    assert_eq!(verify_token("secret", &token).unwrap().id, 42);
  }

  #[test]
  fn wrong_secret_and_expired_tokens_are_unauthorized() {
    let token = issue_token("secret", 42, Duration::hours(1)).unwrap();
    assert!(matches!(verify_token("other", &token), Err(AppError::Unauthorized(_))));

    let expired = issue_token("secret", 42, Duration::hours(-2)).unwrap();
    match verify_token("secret", &expired) {
      Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token has expired."),
      other => panic!("expected expiry rejection, got {:?}", other),
    }
  }

  #[test]
  fn bearer_prefix_is_required() {
    assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
    assert_eq!(bearer_token("Basic abc"), None);
    assert_eq!(bearer_token("Bearer   "), None);
  }
}
