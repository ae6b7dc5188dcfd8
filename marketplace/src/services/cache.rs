// marketplace/src/services/cache.rs

//! Key/value cache with per-entry expiry.
//!
//! `CacheStore` is the seam the order reader depends on. `MemoryCache` is a
//! bounded LRU kept in process: expired entries are dropped when they are
//! next read, there is no background sweep.

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("cache backend unavailable: {0}")]
  Unavailable(String),
}

#[async_trait]
pub trait CacheStore<V>: Send + Sync
where
  V: Clone + Send + Sync + 'static,
{
  async fn get(&self, key: &str) -> Result<Option<V>, CacheError>;

  /// Stores `value` under `key` for `ttl`, replacing any previous entry.
  async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError>;

  /// Returns whether an entry was removed.
  async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

#[derive(Debug)]
struct CacheEntry<V> {
  value: V,
  expires_at: Instant,
}

pub struct MemoryCache<V> {
  entries: Mutex<LruCache<String, CacheEntry<V>>>,
}

impl<V> MemoryCache<V> {
  pub fn new(capacity: NonZeroUsize) -> Self {
    Self {
      entries: Mutex::new(LruCache::new(capacity)),
    }
  }

  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.lock().is_empty()
  }
}

#[async_trait]
impl<V> CacheStore<V> for MemoryCache<V>
where
  V: Clone + Send + Sync + 'static,
{
  async fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
    let mut entries = self.entries.lock();
    match entries.get(key) {
      None => return Ok(None),
      Some(entry) if entry.expires_at > Instant::now() => return Ok(Some(entry.value.clone())),
      Some(_) => {}
    }
    entries.pop(key);
    tracing::trace!(key, "Evicted expired cache entry.");
    Ok(None)
  }

  async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
    let entry = CacheEntry {
      value,
      expires_at: Instant::now() + ttl,
    };
    self.entries.lock().put(key.to_string(), entry);
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<bool, CacheError> {
    Ok(self.entries.lock().pop(key).is_some())
  }
}
