// pasar-api/src/web/handlers/mod.rs

use crate::errors::AppError;

pub mod order_handlers;
pub mod review_handlers;
pub mod webhook_handlers;

/// Parses an `{id}` path segment. Anything that is not a positive id cannot
/// name an order, so it reads as not found.
pub(crate) fn parse_order_id(raw: &str) -> Result<i64, AppError> {
  raw
    .parse::<i64>()
    .ok()
    .filter(|id| *id > 0)
    .ok_or_else(|| AppError::not_found("Order"))
}
