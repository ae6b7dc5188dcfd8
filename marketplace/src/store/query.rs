// marketplace/src/store/query.rs

//! Order listing criteria.
//!
//! `OrderQuery` is an immutable value built with `with_*` methods. The SQL it
//! renders always puts the filters in the same order (buyer, listing, status)
//! followed by ordering and `LIMIT`/`OFFSET`, with every value bound as a
//! parameter.

use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};

use crate::models::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub number: u32,
  pub size: u32,
}

impl Page {
  pub const DEFAULT_SIZE: u32 = 10;
  pub const MAX_SIZE: u32 = 100;

  /// Clamps to page >= 1 and 1 <= size <= `MAX_SIZE`.
  pub fn new(number: Option<u32>, size: Option<u32>) -> Self {
    Self {
      number: number.unwrap_or(1).max(1),
      size: size.unwrap_or(Self::DEFAULT_SIZE).clamp(1, Self::MAX_SIZE),
    }
  }

  pub fn offset(&self) -> i64 {
    i64::from(self.number - 1) * i64::from(self.size)
  }
}

impl Default for Page {
  fn default() -> Self {
    Self::new(None, None)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
  buyer_id: Option<i64>,
  listing_id: Option<i64>,
  status: Option<OrderStatus>,
  page: Page,
}

impl OrderQuery {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_buyer(self, buyer_id: i64) -> Self {
    Self {
      buyer_id: Some(buyer_id),
      ..self
    }
  }

  pub fn with_listing(self, listing_id: i64) -> Self {
    Self {
      listing_id: Some(listing_id),
      ..self
    }
  }

  pub fn with_status(self, status: Option<OrderStatus>) -> Self {
    Self { status, ..self }
  }

  pub fn with_page(self, page: Page) -> Self {
    Self { page, ..self }
  }

  pub fn page(&self) -> Page {
    self.page
  }

  /// Appends ` WHERE ...` (or nothing) for the set filters. Column names
  /// assume the orders table is aliased `o`.
  pub fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>) {
    let mut keyword = " WHERE ";
    if let Some(buyer_id) = self.buyer_id {
      qb.push(keyword).push("o.buyer_id = ").push_bind(buyer_id);
      keyword = " AND ";
    }
    if let Some(listing_id) = self.listing_id {
      qb.push(keyword).push("o.listing_id = ").push_bind(listing_id);
      keyword = " AND ";
    }
    if let Some(status) = self.status {
      qb.push(keyword).push("o.status = ").push_bind(status);
    }
  }

  /// Appends ordering and pagination. Must be the last thing pushed.
  pub fn push_pagination(&self, qb: &mut QueryBuilder<'_, Postgres>) {
    qb.push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
      .push_bind(i64::from(self.page.size))
      .push(" OFFSET ")
      .push_bind(self.page.offset());
  }

  /// Whether `order` passes the filters. Used by the in-memory store.
  pub fn matches(&self, order: &Order) -> bool {
    self.buyer_id.map_or(true, |id| order.buyer_id == id)
      && self.listing_id.map_or(true, |id| order.listing_id == id)
      && self.status.map_or(true, |status| order.status == status)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
  pub items: Vec<T>,
  pub total: i64,
  pub page: Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub current_page: u32,
  pub total_pages: i64,
  pub total_items: i64,
  pub items_per_page: u32,
}

impl<T> PageResult<T> {
  pub fn pagination(&self) -> Pagination {
    let size = i64::from(self.page.size);
    Pagination {
      current_page: self.page.number,
      total_pages: (self.total + size - 1) / size,
      total_items: self.total,
      items_per_page: self.page.size,
    }
  }
}
