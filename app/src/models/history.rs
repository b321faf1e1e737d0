// pasar-api/src/models/history.rs

use super::order::Order;
use serde::Serialize;
use sqlx::FromRow;

/// One row of a buyer's transaction history.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistoryEntry {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub order: Order,
  pub store_id: i64,
  pub store_name: String,
  pub review_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub current_page: i64,
  pub page_size: i64,
  pub total_orders: i64,
  pub total_pages: i64,
}

impl Pagination {
  /// `current_page` is echoed, not clamped. A non-positive `page_size`
  /// yields no pages.
  pub fn new(current_page: i64, page_size: i64, total_orders: i64) -> Self {
    let total_pages = if total_orders <= 0 || page_size <= 0 {
      0
    } else {
      total_orders / page_size + i64::from(total_orders % page_size != 0)
    };
    Self {
      current_page,
      page_size,
      total_orders,
      total_pages,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionHistory {
  pub orders: Vec<OrderHistoryEntry>,
  pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
  use super::Pagination;

  #[test]
  fn total_pages_rounds_up() {
    assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
    assert_eq!(Pagination::new(1, 10, 1).total_pages, 1);
    assert_eq!(Pagination::new(1, 10, 10).total_pages, 1);
    assert_eq!(Pagination::new(1, 10, 11).total_pages, 2);
    assert_eq!(Pagination::new(1, 3, 7).total_pages, 3);
  }

  #[test]
  fn huge_page_sizes_do_not_overflow() {
    assert_eq!(Pagination::new(1, i64::MAX, 2).total_pages, 1);
    assert_eq!(Pagination::new(1, i64::MAX, i64::MAX).total_pages, 1);
    assert_eq!(Pagination::new(1, 1, i64::MAX).total_pages, i64::MAX);
  }

  #[test]
  fn non_positive_page_sizes_yield_no_pages() {
    assert_eq!(Pagination::new(1, 0, 5).total_pages, 0);
    assert_eq!(Pagination::new(1, -3, 5).total_pages, 0);
  }

  #[test]
  fn current_page_is_echoed_beyond_the_last_page() {
    let p = Pagination::new(9, 5, 6);
    assert_eq!(p.current_page, 9);
    assert_eq!(p.total_pages, 2);
  }
}
