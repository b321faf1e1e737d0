// pasar-api/src/services/payment/midtrans.rs

//! Midtrans over its REST API: Snap for hosted checkout, Core API for status
//! and cancellation.

use super::{PaymentGateway, PaymentSession};
use crate::errors::{AppError, Result};
use crate::lifecycle::{FraudStatus, GatewayNotification, TransactionStatus};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha512};
use std::time::Duration;
use tracing::{info, instrument, warn};

const SNAP_SANDBOX: &str = "https://app.sandbox.midtrans.com";
const SNAP_PRODUCTION: &str = "https://app.midtrans.com";
const API_SANDBOX: &str = "https://api.sandbox.midtrans.com";
const API_PRODUCTION: &str = "https://api.midtrans.com";

/// Core API `status_code` values that mean the cancel needs no retry.
const CANCEL_SETTLED_CODES: [&str; 3] = ["200", "404", "412"];

#[derive(Debug, Deserialize)]
struct SnapResponse {
  token: String,
  redirect_url: String,
}

/// Fields Midtrans posts to the notification URL.
#[derive(Debug, Deserialize)]
struct NotificationPayload {
  order_id: String,
  status_code: String,
  gross_amount: String,
  signature_key: String,
}

/// Core API answer for status and cancel calls.
#[derive(Debug, Deserialize)]
struct CoreApiResponse {
  status_code: String,
  #[serde(default)]
  status_message: Option<String>,
  #[serde(default)]
  order_id: Option<String>,
  #[serde(default)]
  transaction_status: Option<String>,
  #[serde(default)]
  fraud_status: Option<String>,
}

pub struct MidtransGateway {
  http: reqwest::Client,
  server_key: String,
  snap_base: String,
  api_base: String,
}

impl MidtransGateway {
  pub fn new(server_key: &str, is_production: bool) -> Result<Self> {
    let (snap_base, api_base) = if is_production {
      (SNAP_PRODUCTION, API_PRODUCTION)
    } else {
      (SNAP_SANDBOX, API_SANDBOX)
    };
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(15))
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Self {
      http,
      server_key: server_key.to_string(),
      snap_base: snap_base.to_string(),
      api_base: api_base.to_string(),
    })
  }

  /// SHA-512 hex of `order_id + status_code + gross_amount + server_key`.
  fn signature(&self, order_id: &str, status_code: &str, gross_amount: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(self.server_key.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn verify(&self, payload: &NotificationPayload) -> bool {
    let expected = self.signature(&payload.order_id, &payload.status_code, &payload.gross_amount);
    expected.eq_ignore_ascii_case(payload.signature_key.trim())
  }

  async fn core_api_get(&self, path: &str) -> Result<CoreApiResponse> {
    let resp = self
      .http
      .get(format!("{}{}", self.api_base, path))
      .basic_auth(&self.server_key, None::<&str>)
      .header("Accept", "application/json")
      .send()
      .await
      .map_err(|e| AppError::Payment(format!("Midtrans request failed: {}", e)))?;
    resp
      .json::<CoreApiResponse>()
      .await
      .map_err(|e| AppError::Payment(format!("Unreadable Midtrans response: {}", e)))
  }
}

#[async_trait]
impl PaymentGateway for MidtransGateway {
  #[instrument(name = "midtrans::create_session", skip(self))]
  async fn create_session(&self, reference: &str, amount: i64, expiry_hours: i64) -> Result<PaymentSession> {
    let body = json!({
      "transaction_details": { "order_id": reference, "gross_amount": amount },
      "expiry": { "unit": "hours", "duration": expiry_hours },
    });
    let resp = self
      .http
      .post(format!("{}/snap/v1/transactions", self.snap_base))
      .basic_auth(&self.server_key, None::<&str>)
      .header("Accept", "application/json")
      .json(&body)
      .send()
      .await
      .map_err(|e| AppError::Payment(format!("Midtrans request failed: {}", e)))?;

    let status = resp.status();
    if !status.is_success() {
      let detail = resp.text().await.unwrap_or_default();
      warn!(%status, "Snap rejected the transaction.");
      return Err(AppError::Payment(format!("Snap returned {}: {}", status, detail)));
    }
    let snap: SnapResponse = resp
      .json()
      .await
      .map_err(|e| AppError::Payment(format!("Unreadable Snap response: {}", e)))?;
    info!("Snap session created.");
    Ok(PaymentSession {
      token: snap.token,
      redirect_url: snap.redirect_url,
    })
  }

  #[instrument(name = "midtrans::cancel_session", skip(self))]
  async fn cancel_session(&self, reference: &str) -> Result<()> {
    let resp = self
      .http
      .post(format!("{}/v2/{}/cancel", self.api_base, reference))
      .basic_auth(&self.server_key, None::<&str>)
      .header("Accept", "application/json")
      .send()
      .await
      .map_err(|e| AppError::Payment(format!("Midtrans request failed: {}", e)))?;
    let answer: CoreApiResponse = resp
      .json()
      .await
      .map_err(|e| AppError::Payment(format!("Unreadable Midtrans response: {}", e)))?;

    if CANCEL_SETTLED_CODES.contains(&answer.status_code.as_str()) {
      info!(status_code = %answer.status_code, "Remote transaction cancelled or nothing to cancel.");
      return Ok(());
    }
    Err(AppError::Payment(format!(
      "Cancel returned {}: {}",
      answer.status_code,
      answer.status_message.unwrap_or_default()
    )))
  }

  #[instrument(name = "midtrans::decode_notification", skip_all)]
  async fn decode_notification(&self, raw: &serde_json::Value) -> Result<GatewayNotification> {
    let payload: NotificationPayload = serde_json::from_value(raw.clone())
      .map_err(|e| AppError::validation("notification", format!("Malformed notification: {}", e)))?;
    if !self.verify(&payload) {
      warn!(order_id = %payload.order_id, "Notification signature mismatch.");
      return Err(AppError::Unauthorized("Invalid notification signature".to_string()));
    }

    // The posted body is only a hint; the status endpoint is authoritative.
    let status = self.core_api_get(&format!("/v2/{}/status", payload.order_id)).await?;
    if status.status_code == "404" {
      return Err(AppError::not_found("Transaction"));
    }
    let transaction_status = status
      .transaction_status
      .as_deref()
      .map(TransactionStatus::parse)
      .ok_or_else(|| AppError::Payment("Status response without transaction_status".to_string()))?;

    Ok(GatewayNotification {
      reference: status.order_id.unwrap_or(payload.order_id),
      transaction_status,
      fraud_status: status.fraud_status.as_deref().map(FraudStatus::parse),
    })
  }
}
