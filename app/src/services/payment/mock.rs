// pasar-api/src/services/payment/mock.rs

//! In-process gateway for local runs (`PAYMENT_PROVIDER=mock`) and tests.
//!
//! Notifications are plain JSON `{ order_id, transaction_status, fraud_status }`
//! and are trusted as-is unless rejection is switched on.

use super::{PaymentGateway, PaymentSession};
use crate::errors::{AppError, Result};
use crate::lifecycle::{FraudStatus, GatewayNotification, TransactionStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Default)]
pub struct MockPaymentGateway {
  latency: Duration,
  fail_create: AtomicBool,
  fail_cancel: AtomicBool,
  reject_notifications: AtomicBool,
  created: Mutex<Vec<String>>,
  cancelled: Mutex<Vec<String>>,
}

impl MockPaymentGateway {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sleeps this long inside every call.
  pub fn with_latency(latency: Duration) -> Self {
    Self {
      latency,
      ..Self::default()
    }
  }

  pub fn set_fail_create(&self, fail: bool) {
    self.fail_create.store(fail, Ordering::SeqCst);
  }

  pub fn set_fail_cancel(&self, fail: bool) {
    self.fail_cancel.store(fail, Ordering::SeqCst);
  }

  pub fn set_reject_notifications(&self, reject: bool) {
    self.reject_notifications.store(reject, Ordering::SeqCst);
  }

  /// References of every session opened so far.
  pub fn created_sessions(&self) -> Vec<String> {
    self.created.lock().clone()
  }

  /// References of every cancel call, including failed ones.
  pub fn cancel_calls(&self) -> Vec<String> {
    self.cancelled.lock().clone()
  }

  async fn simulate_latency(&self) {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  #[instrument(name = "mock_gateway::create_session", skip(self))]
  async fn create_session(&self, reference: &str, amount: i64, expiry_hours: i64) -> Result<PaymentSession> {
    self.simulate_latency().await;
    if amount <= 0 {
      return Err(AppError::Payment("Amount must be greater than zero".to_string()));
    }
    if self.fail_create.load(Ordering::SeqCst) {
      return Err(AppError::Payment("Mock gateway refused to open a session".to_string()));
    }
    self.created.lock().push(reference.to_string());
    let token = Uuid::new_v4().to_string();
    info!("Simulated session opened.");
    Ok(PaymentSession {
      redirect_url: format!("https://pay.mock.test/snap/v2/vtweb/{}", token),
      token,
    })
  }

  #[instrument(name = "mock_gateway::cancel_session", skip(self))]
  async fn cancel_session(&self, reference: &str) -> Result<()> {
    self.simulate_latency().await;
    self.cancelled.lock().push(reference.to_string());
    if self.fail_cancel.load(Ordering::SeqCst) {
      return Err(AppError::Payment("Mock gateway cancel failed".to_string()));
    }
    Ok(())
  }

  async fn decode_notification(&self, raw: &serde_json::Value) -> Result<GatewayNotification> {
    self.simulate_latency().await;
    if self.reject_notifications.load(Ordering::SeqCst) {
      return Err(AppError::Unauthorized("Invalid notification signature".to_string()));
    }
    let field = |name: &str| raw.get(name).and_then(serde_json::Value::as_str);
    let reference = field("order_id")
      .ok_or_else(|| AppError::validation("order_id", "The order_id field is required"))?;
    let transaction_status = field("transaction_status")
      .ok_or_else(|| AppError::validation("transaction_status", "The transaction_status field is required"))?;
    Ok(GatewayNotification {
      reference: reference.to_string(),
      transaction_status: TransactionStatus::parse(transaction_status),
      fraud_status: field("fraud_status").map(FraudStatus::parse),
    })
  }
}
