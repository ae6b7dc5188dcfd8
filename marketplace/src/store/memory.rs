// marketplace/src/store/memory.rs

//! In-process `MarketStore`.
//!
//! Holds everything behind one `parking_lot::Mutex`. An order batch is built
//! in a staging copy and only swapped in once every step succeeded, which
//! gives the same all-or-nothing outcome as the Postgres transaction. A
//! `FailPoint` makes a chosen step fail, and a read counter lets tests see how
//! often order details were loaded.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sqlx::types::Json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::query::{OrderQuery, PageResult};
use super::{OrderStore, SellerPolicies, ShippingCatalog, StoreError, StoreHealth, StoreResult};
use crate::models::{
  Listing, NewOrderBatch, Order, OrderDetail, OrderItem, OrderStatus, OrderSummary, SellerShippingPolicy,
  ShippingMethod,
};

/// Step of `insert_order_batch` that should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
  OrderInsert,
  OrderItemInsert,
}

#[derive(Debug, Default, Clone)]
struct Tables {
  orders: BTreeMap<i64, Order>,
  order_items: BTreeMap<i64, OrderItem>,
  listings: HashMap<i64, Listing>,
  shipping_methods: BTreeMap<i64, ShippingMethod>,
  policies: HashMap<i64, SellerShippingPolicy>,
  next_order_id: i64,
  next_item_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
  fail_point: Mutex<Option<FailPoint>>,
  unavailable: AtomicBool,
  order_detail_reads: AtomicUsize,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_listing(self, listing: Listing) -> Self {
    self.tables.lock().listings.insert(listing.id, listing);
    self
  }

  pub fn with_shipping_method(self, method: ShippingMethod) -> Self {
    self.tables.lock().shipping_methods.insert(method.id, method);
    self
  }

  pub fn with_policy(self, policy: SellerShippingPolicy) -> Self {
    self.tables.lock().policies.insert(policy.seller_id, policy);
    self
  }

  /// Makes the next order batches fail at `point` until cleared with `None`.
  pub fn fail_at(&self, point: Option<FailPoint>) {
    *self.fail_point.lock() = point;
  }

  /// Simulates an exhausted or unreachable connection pool.
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  pub fn order_detail_reads(&self) -> usize {
    self.order_detail_reads.load(Ordering::SeqCst)
  }

  pub fn order_count(&self) -> usize {
    self.tables.lock().orders.len()
  }

  pub fn order_item_count(&self) -> usize {
    self.tables.lock().order_items.len()
  }

  pub fn orders(&self) -> Vec<Order> {
    self.tables.lock().orders.values().cloned().collect()
  }

  pub fn order_items(&self) -> Vec<OrderItem> {
    self.tables.lock().order_items.values().cloned().collect()
  }

  fn check_available(&self) -> StoreResult<()> {
    if self.unavailable.load(Ordering::SeqCst) {
      return Err(StoreError::Unavailable("pool timed out while waiting for an open connection".to_string()));
    }
    Ok(())
  }

  fn injected(&self, point: FailPoint) -> bool {
    *self.fail_point.lock() == Some(point)
  }

  fn summary_for(tables: &Tables, order: &Order) -> OrderSummary {
    let listing = tables.listings.get(&order.listing_id);
    OrderSummary {
      order: order.clone(),
      listing_title: listing.map(|l| l.title.clone()),
      listing_image: listing.and_then(|l| l.image_url.clone()),
    }
  }
}

#[async_trait]
impl ShippingCatalog for MemoryStore {
  async fn active_shipping_methods(&self) -> StoreResult<Vec<ShippingMethod>> {
    self.check_available()?;
    Ok(
      self
        .tables
        .lock()
        .shipping_methods
        .values()
        .filter(|m| m.is_active)
        .cloned()
        .collect(),
    )
  }

  async fn shipping_method(&self, id: i64) -> StoreResult<Option<ShippingMethod>> {
    self.check_available()?;
    Ok(self.tables.lock().shipping_methods.get(&id).cloned())
  }
}

#[async_trait]
impl SellerPolicies for MemoryStore {
  async fn seller_policies(&self, seller_ids: &[i64]) -> StoreResult<Vec<SellerShippingPolicy>> {
    self.check_available()?;
    let tables = self.tables.lock();
    Ok(seller_ids.iter().filter_map(|id| tables.policies.get(id).cloned()).collect())
  }

  async fn seller_policy(&self, seller_id: i64) -> StoreResult<Option<SellerShippingPolicy>> {
    self.check_available()?;
    Ok(self.tables.lock().policies.get(&seller_id).cloned())
  }

  async fn upsert_seller_policy(&self, policy: &SellerShippingPolicy) -> StoreResult<SellerShippingPolicy> {
    self.check_available()?;
    self.tables.lock().policies.insert(policy.seller_id, policy.clone());
    Ok(policy.clone())
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn insert_order_batch(&self, batch: &NewOrderBatch) -> StoreResult<Vec<i64>> {
    self.check_available()?;
    let mut tables = self.tables.lock();
    let mut staged = tables.clone();

    if self.injected(FailPoint::OrderInsert) {
      return Err(StoreError::Transaction {
        stage: "insert_orders",
        message: "injected failure".to_string(),
      });
    }

    let created_at = Utc::now();
    let mut order_ids = Vec::with_capacity(batch.lines.len());
    for line in &batch.lines {
      staged.next_order_id += 1;
      let id = staged.next_order_id;
      staged.orders.insert(
        id,
        Order {
          id,
          buyer_id: batch.buyer_id,
          listing_id: line.listing_id,
          price_at_purchase: line.amounts.total,
          subtotal: line.amounts.subtotal,
          tax_amount: line.amounts.tax,
          tax_rate: batch.tax_rate,
          payment_id: batch.payment_id.clone(),
          status: OrderStatus::Pending,
          shipping_info: batch.shipping_info.clone().map(Json),
          is_paid: batch.is_paid(),
          created_at,
        },
      );
      order_ids.push(id);
    }

    if self.injected(FailPoint::OrderItemInsert) {
      // `staged` already holds the orders; dropping it is the rollback.
      return Err(StoreError::Transaction {
        stage: "insert_order_items",
        message: "injected failure".to_string(),
      });
    }

    for (order_id, line) in order_ids.iter().zip(&batch.lines) {
      staged.next_item_id += 1;
      let id = staged.next_item_id;
      staged.order_items.insert(
        id,
        OrderItem {
          id,
          order_id: *order_id,
          listing_id: line.listing_id,
          quantity: line.quantity,
          price: line.unit_price,
        },
      );
    }

    *tables = staged;
    Ok(order_ids)
  }

  async fn order_detail(&self, order_id: i64) -> StoreResult<Option<OrderDetail>> {
    self.check_available()?;
    self.order_detail_reads.fetch_add(1, Ordering::SeqCst);
    let tables = self.tables.lock();
    let Some(order) = tables.orders.get(&order_id) else {
      return Ok(None);
    };
    let items = tables
      .order_items
      .values()
      .filter(|item| item.order_id == order_id)
      .cloned()
      .collect();
    Ok(Some(OrderDetail {
      summary: Self::summary_for(&tables, order),
      items,
    }))
  }

  async fn list_orders(&self, query: &OrderQuery) -> StoreResult<PageResult<OrderSummary>> {
    self.check_available()?;
    let tables = self.tables.lock();
    let mut matching: Vec<&Order> = tables.orders.values().filter(|o| query.matches(o)).collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let page = query.page();
    let items = matching
      .iter()
      .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
      .take(page.size as usize)
      .map(|o| Self::summary_for(&tables, o))
      .collect();

    Ok(PageResult {
      items,
      total: matching.len() as i64,
      page,
    })
  }
}

#[async_trait]
impl StoreHealth for MemoryStore {
  async fn ping(&self) -> StoreResult<()> {
    self.check_available()
  }
}
