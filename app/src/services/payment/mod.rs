// pasar-api/src/services/payment/mod.rs

//! Hosted-checkout payment gateway contract.

pub mod midtrans;
pub mod mock;

use crate::errors::Result;
use crate::lifecycle::GatewayNotification;
use async_trait::async_trait;
use serde::Serialize;

pub use midtrans::MidtransGateway;
pub use mock::MockPaymentGateway;

/// A hosted checkout page opened for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
  pub token: String,
  pub redirect_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Opens a session for `amount` under `reference`, payable for `expiry_hours`.
  async fn create_session(&self, reference: &str, amount: i64, expiry_hours: i64) -> Result<PaymentSession>;

  /// Cancels the remote transaction. Succeeds for sessions that are already
  /// cancelled or unknown to the gateway.
  async fn cancel_session(&self, reference: &str) -> Result<()>;

  /// Verifies a server-to-server notification and returns its authoritative status.
  async fn decode_notification(&self, raw: &serde_json::Value) -> Result<GatewayNotification>;
}
