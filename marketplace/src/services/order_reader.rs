// marketplace/src/services/order_reader.rs

//! Cached order reads.
//!
//! `get_order` serves `order:{id}` from the cache when present and otherwise
//! loads the joined order from the store and caches it. Orders do not change
//! after checkout, so nothing here invalidates entries. Cache failures are
//! logged and the store is used instead.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::errors::{AppError, Result};
use crate::models::{OrderDetail, OrderSummary};
use crate::services::cache::CacheStore;
use crate::store::{MarketStore, OrderQuery, OrderStore, PageResult};

pub fn order_cache_key(order_id: i64) -> String {
  format!("order:{}", order_id)
}

pub struct OrderReader {
  store: Arc<dyn MarketStore>,
  cache: Arc<dyn CacheStore<OrderDetail>>,
  ttl: Duration,
}

impl OrderReader {
  pub fn new(store: Arc<dyn MarketStore>, cache: Arc<dyn CacheStore<OrderDetail>>, ttl: Duration) -> Self {
    Self { store, cache, ttl }
  }

  #[instrument(name = "OrderReader::get_order", skip(self))]
  pub async fn get_order(&self, order_id: i64) -> Result<OrderDetail> {
    let key = order_cache_key(order_id);

    match self.cache.get(&key).await {
      Ok(Some(detail)) => {
        debug!(%key, "Order cache hit.");
        return Ok(detail);
      }
      Ok(None) => debug!(%key, "Order cache miss."),
      Err(e) => warn!(%key, error = %e, "Order cache read failed; reading from the store."),
    }

    let detail = self
      .store
      .order_detail(order_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    if let Err(e) = self.cache.set(&key, detail.clone(), self.ttl).await {
      warn!(%key, error = %e, "Failed to cache order detail.");
    }
    Ok(detail)
  }

  /// Paginated listing. Not cached.
  #[instrument(name = "OrderReader::list_orders", skip(self))]
  pub async fn list_orders(&self, query: &OrderQuery) -> Result<PageResult<OrderSummary>> {
    Ok(self.store.list_orders(query).await?)
  }
}
