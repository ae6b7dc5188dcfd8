// marketplace/src/store/mod.rs

//! Data store seams.
//!
//! Handlers and pipelines only see `dyn MarketStore`. `PgStore` backs it with
//! Postgres; `MemoryStore` keeps everything in process and can inject write
//! failures for tests.

pub mod memory;
pub mod postgres;
pub mod query;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewOrderBatch, OrderDetail, OrderSummary, SellerShippingPolicy, ShippingMethod};
pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgStore;
pub use query::{OrderQuery, Page, PageResult};

#[derive(Debug, Error)]
pub enum StoreError {
  /// No connection could be had in time, or the pool is closed. Retryable.
  #[error("data store unavailable: {0}")]
  Unavailable(String),

  /// A statement inside the order transaction failed; nothing was committed.
  #[error("order transaction rolled back at '{stage}': {message}")]
  Transaction { stage: &'static str, message: String },

  #[error("{0}")]
  Query(String),
}

impl StoreError {
  fn is_pool_failure(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_))
  }

  pub(crate) fn query(err: sqlx::Error) -> Self {
    if Self::is_pool_failure(&err) {
      StoreError::Unavailable(err.to_string())
    } else {
      StoreError::Query(err.to_string())
    }
  }

  pub(crate) fn transaction(stage: &'static str, err: sqlx::Error) -> Self {
    if Self::is_pool_failure(&err) {
      StoreError::Unavailable(err.to_string())
    } else {
      StoreError::Transaction {
        stage,
        message: err.to_string(),
      }
    }
  }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ShippingCatalog: Send + Sync {
  async fn active_shipping_methods(&self) -> StoreResult<Vec<ShippingMethod>>;

  /// Looks a method up regardless of whether it is active.
  async fn shipping_method(&self, id: i64) -> StoreResult<Option<ShippingMethod>>;
}

#[async_trait]
pub trait SellerPolicies: Send + Sync {
  /// Policies for the given sellers. Sellers without a profile row are
  /// simply absent from the result.
  async fn seller_policies(&self, seller_ids: &[i64]) -> StoreResult<Vec<SellerShippingPolicy>>;

  async fn seller_policy(&self, seller_id: i64) -> StoreResult<Option<SellerShippingPolicy>>;

  async fn upsert_seller_policy(&self, policy: &SellerShippingPolicy) -> StoreResult<SellerShippingPolicy>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Writes one order and one order item per batch line in a single
  /// transaction. Returns the order ids in line order.
  async fn insert_order_batch(&self, batch: &NewOrderBatch) -> StoreResult<Vec<i64>>;

  async fn order_detail(&self, order_id: i64) -> StoreResult<Option<OrderDetail>>;

  async fn list_orders(&self, query: &OrderQuery) -> StoreResult<PageResult<OrderSummary>>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
  async fn ping(&self) -> StoreResult<()>;
}

pub trait MarketStore: ShippingCatalog + SellerPolicies + OrderStore + StoreHealth {}

impl<T> MarketStore for T where T: ShippingCatalog + SellerPolicies + OrderStore + StoreHealth {}
