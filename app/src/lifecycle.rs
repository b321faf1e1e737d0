// pasar-api/src/lifecycle.rs

//! Order status transitions.
//!
//! Every status change an order can go through is decided here, as a total
//! function of the current status and the event. Pipelines apply the result
//! with a compare-and-set on the stored status.

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderStatus};
use chrono::{DateTime, Utc};

/// `transaction_status` of a gateway notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
  Capture,
  Settlement,
  Cancel,
  Deny,
  Expire,
  Pending,
  Other(String),
}

impl TransactionStatus {
  pub fn parse(raw: &str) -> Self {
    match raw.trim().to_ascii_lowercase().as_str() {
      "capture" => Self::Capture,
      "settlement" => Self::Settlement,
      "cancel" => Self::Cancel,
      "deny" => Self::Deny,
      "expire" => Self::Expire,
      "pending" => Self::Pending,
      _ => Self::Other(raw.to_string()),
    }
  }
}

/// `fraud_status` of a gateway notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FraudStatus {
  Accept,
  Challenge,
  Deny,
  Other(String),
}

impl FraudStatus {
  pub fn parse(raw: &str) -> Self {
    match raw.trim().to_ascii_lowercase().as_str() {
      "accept" => Self::Accept,
      "challenge" => Self::Challenge,
      "deny" => Self::Deny,
      _ => Self::Other(raw.to_string()),
    }
  }
}

/// A verified notification, reduced to what reconciliation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayNotification {
  pub reference: String,
  pub transaction_status: TransactionStatus,
  pub fraud_status: Option<FraudStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnchangedReason {
  /// The gateway still waits for payment or review.
  StillPending,
  /// PAID or EXPIRED orders never move again.
  Terminal,
  /// A status (or fraud status) this service does not act on.
  Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Move { to: OrderStatus, return_stock: bool },
  Unchanged(UnchangedReason),
  /// Order is already CANCELED locally; make sure the remote session is too.
  CancelRemote,
}

impl Transition {
  /// `paid_at` to stamp when this transition is applied.
  pub fn paid_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match self {
      Transition::Move {
        to: OrderStatus::Paid,
        ..
      } => Some(now),
      _ => None,
    }
  }
}

pub fn on_notification(current: OrderStatus, notification: &GatewayNotification) -> Transition {
  use TransactionStatus as Tx;

  match current {
    OrderStatus::Canceled => return Transition::CancelRemote,
    OrderStatus::Paid | OrderStatus::Expired => return Transition::Unchanged(UnchangedReason::Terminal),
    OrderStatus::Pending => {}
  }

  let move_to = |to, return_stock| Transition::Move { to, return_stock };
  match &notification.transaction_status {
    Tx::Capture => match &notification.fraud_status {
      Some(FraudStatus::Accept) => move_to(OrderStatus::Paid, false),
      Some(FraudStatus::Challenge) => Transition::Unchanged(UnchangedReason::StillPending),
      _ => Transition::Unchanged(UnchangedReason::Unrecognized),
    },
    Tx::Settlement => move_to(OrderStatus::Paid, false),
    Tx::Cancel => move_to(OrderStatus::Canceled, false),
    Tx::Deny | Tx::Expire => move_to(OrderStatus::Expired, true),
    Tx::Pending => Transition::Unchanged(UnchangedReason::StillPending),
    Tx::Other(_) => Transition::Unchanged(UnchangedReason::Unrecognized),
  }
}

/// Owner cancellation. Only pending orders can be cancelled.
pub fn on_owner_cancel(current: OrderStatus) -> Result<Transition> {
  if current != OrderStatus::Pending {
    return Err(AppError::domain("Only pending orders can be cancelled"));
  }
  Ok(Transition::Move {
    to: OrderStatus::Canceled,
    return_stock: true,
  })
}

/// Lazy expiry, checked whenever an order is read for the history. `None`
/// when the order is settled or still within its payment window.
pub fn on_read(order: &Order, now: DateTime<Utc>) -> Option<Transition> {
  if order.status.is_terminal() || !order.is_overdue(now) {
    return None;
  }
  Some(Transition::Move {
    to: OrderStatus::Expired,
    return_stock: true,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn notification(tx: &str, fraud: Option<&str>) -> GatewayNotification {
    GatewayNotification {
      reference: "ORDER-test".to_string(),
      transaction_status: TransactionStatus::parse(tx),
      fraud_status: fraud.map(FraudStatus::parse),
    }
  }

  fn paid() -> Transition {
    Transition::Move {
      to: OrderStatus::Paid,
      return_stock: false,
    }
  }

  #[test]
  fn pending_order_follows_the_gateway_table() {
    let cases = [
      ("capture", Some("challenge"), Transition::Unchanged(UnchangedReason::StillPending)),
      ("capture", Some("accept"), paid()),
      ("settlement", None, paid()),
      ("settlement", Some("challenge"), paid()),
      (
        "cancel",
        None,
        Transition::Move {
          to: OrderStatus::Canceled,
          return_stock: false,
        },
      ),
      (
        "deny",
        None,
        Transition::Move {
          to: OrderStatus::Expired,
          return_stock: true,
        },
      ),
      (
        "expire",
        None,
        Transition::Move {
          to: OrderStatus::Expired,
          return_stock: true,
        },
      ),
      ("pending", None, Transition::Unchanged(UnchangedReason::StillPending)),
    ];
    for (tx, fraud, expected) in cases {
      assert_eq!(
        on_notification(OrderStatus::Pending, &notification(tx, fraud)),
        expected,
        "transaction_status={tx} fraud_status={fraud:?}"
      );
    }
  }

  #[test]
  fn unknown_statuses_leave_the_order_alone() {
    assert_eq!(
      on_notification(OrderStatus::Pending, &notification("refund", None)),
      Transition::Unchanged(UnchangedReason::Unrecognized)
    );
    assert_eq!(
      on_notification(OrderStatus::Pending, &notification("capture", Some("deny"))),
      Transition::Unchanged(UnchangedReason::Unrecognized)
    );
    assert_eq!(
      on_notification(OrderStatus::Pending, &notification("capture", None)),
      Transition::Unchanged(UnchangedReason::Unrecognized)
    );
  }

  #[test]
  fn canceled_orders_only_trigger_a_remote_cancel() {
    for tx in ["settlement", "capture", "expire", "whatever"] {
      assert_eq!(
        on_notification(OrderStatus::Canceled, &notification(tx, Some("accept"))),
        Transition::CancelRemote
      );
    }
  }

  #[test]
  fn paid_and_expired_orders_never_move() {
    for status in [OrderStatus::Paid, OrderStatus::Expired] {
      for tx in ["settlement", "cancel", "deny", "expire", "pending"] {
        assert_eq!(
          on_notification(status, &notification(tx, None)),
          Transition::Unchanged(UnchangedReason::Terminal)
        );
      }
    }
  }

  #[test]
  fn status_strings_are_case_insensitive() {
    assert_eq!(TransactionStatus::parse("SETTLEMENT"), TransactionStatus::Settlement);
    assert_eq!(FraudStatus::parse(" Accept "), FraudStatus::Accept);
  }

  #[test]
  fn only_pending_orders_can_be_cancelled_by_owner() {
    assert_eq!(
      on_owner_cancel(OrderStatus::Pending).unwrap(),
      Transition::Move {
        to: OrderStatus::Canceled,
        return_stock: true
      }
    );
    for status in [OrderStatus::Paid, OrderStatus::Canceled, OrderStatus::Expired] {
      let err = on_owner_cancel(status).unwrap_err();
      assert_eq!(err.to_string(), "Only pending orders can be cancelled");
    }
  }

  #[test]
  fn only_paid_transitions_stamp_paid_at() {
    let now = Utc::now();
    assert_eq!(paid().paid_at(now), Some(now));
    assert_eq!(on_owner_cancel(OrderStatus::Pending).unwrap().paid_at(now), None);
    assert_eq!(Transition::CancelRemote.paid_at(now), None);
  }

  fn order_due_in(offset: Duration, status: OrderStatus) -> Order {
    let now = Utc::now();
    Order {
      id: 1,
      order_reference: "ORDER-x".to_string(),
      user_id: 1,
      product_id: 1,
      quantity: 1,
      total_amount: 10,
      product_name: "Tea".to_string(),
      product_price: 10,
      product_image: None,
      payment_token: "tok".to_string(),
      redirect_url: "https://pay.example/tok".to_string(),
      payment_due: now + offset,
      paid_at: None,
      status,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn reads_expire_overdue_pending_orders() {
    let now = Utc::now();
    assert_eq!(
      on_read(&order_due_in(Duration::hours(-1), OrderStatus::Pending), now),
      Some(Transition::Move {
        to: OrderStatus::Expired,
        return_stock: true
      })
    );
    assert_eq!(on_read(&order_due_in(Duration::hours(1), OrderStatus::Pending), now), None);
    assert_eq!(on_read(&order_due_in(Duration::hours(-1), OrderStatus::Paid), now), None);
  }
}
