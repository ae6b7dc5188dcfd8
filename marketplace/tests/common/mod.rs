// marketplace/tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use marketplace::config::AppConfig;
use marketplace::models::{
  Listing, NewOrderBatch, OrderDetail, OrderSummary, SellerShippingPolicy, ShippingMethod, ShippingProvider,
};
use marketplace::services::{CacheError, CacheStore, MemoryCache};
use marketplace::state::AppState;
use marketplace::store::{
  MemoryStore, OrderQuery, OrderStore, PageResult, SellerPolicies, ShippingCatalog, StoreHealth, StoreResult,
};

pub const USPS_GROUND: i64 = 1;
pub const UPS_GROUND: i64 = 2;
pub const FEDEX_2DAY: i64 = 3;
pub const RETIRED_METHOD: i64 = 4;

/// Seller with no policy row.
pub const SELLER_WITHOUT_POLICY: i64 = 5;
/// Offers free shipping and also has a $10 flat fee on file.
pub const SELLER_FREE_SHIPPING: i64 = 6;
/// Charges a flat $5.00.
pub const SELLER_FLAT_FIVE: i64 = 7;

static TRACING: Lazy<()> = Lazy::new(|| {
  let filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

fn method(id: i64, provider: ShippingProvider, code: &str, display: &str, active: bool) -> ShippingMethod {
  ShippingMethod {
    id,
    name: code.to_lowercase(),
    provider,
    service_code: code.to_string(),
    display_name: display.to_string(),
    is_active: active,
  }
}

fn listing(id: i64, seller_id: i64, title: &str, price: Decimal) -> Listing {
  Listing {
    id,
    seller_id,
    title: title.to_string(),
    image_url: Some(format!("https://img.example/listings/{}.jpg", id)),
    price,
  }
}

pub fn seeded_store() -> MemoryStore {
  MemoryStore::new()
    .with_shipping_method(method(USPS_GROUND, ShippingProvider::Usps, "GROUND_ADVANTAGE", "USPS Ground Advantage", true))
    .with_shipping_method(method(UPS_GROUND, ShippingProvider::Ups, "UPS_GROUND", "UPS Ground", true))
    .with_shipping_method(method(FEDEX_2DAY, ShippingProvider::FedEx, "FEDEX_2_DAY", "FedEx 2Day", true))
    .with_shipping_method(method(RETIRED_METHOD, ShippingProvider::Usps, "FIRST_CLASS", "USPS First-Class", false))
    .with_listing(listing(1, SELLER_WITHOUT_POLICY, "Vintage camera strap", Decimal::new(1000, 2)))
    .with_listing(listing(2, SELLER_FREE_SHIPPING, "Hand-bound notebook", Decimal::new(499, 2)))
    .with_listing(listing(3, SELLER_FLAT_FIVE, "Enamel pin set", Decimal::new(1250, 2)))
    .with_policy(SellerShippingPolicy {
      seller_id: SELLER_FREE_SHIPPING,
      offers_free_shipping: true,
      standard_shipping_fee: Decimal::new(1000, 2),
      uses_calculated_shipping: false,
      policy_text: Some("Ships free within 2 business days.".to_string()),
    })
    .with_policy(SellerShippingPolicy {
      seller_id: SELLER_FLAT_FIVE,
      offers_free_shipping: false,
      standard_shipping_fee: Decimal::new(500, 2),
      uses_calculated_shipping: false,
      policy_text: None,
    })
}

pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
  let mut vars: HashMap<String, String> = HashMap::new();
  vars.insert("DATABASE_URL".into(), "postgres://localhost/marketplace_test".into());
  vars.insert("ORDER_CACHE_TTL_SECS".into(), "60".into());
  for (k, v) in overrides {
    vars.insert(k.to_string(), v.to_string());
  }
  AppConfig::from_source(|name| vars.get(name).cloned()).expect("test config should load")
}

pub fn memory_cache() -> Arc<dyn CacheStore<OrderDetail>> {
  Arc::new(MemoryCache::new(std::num::NonZeroUsize::new(64).unwrap()))
}

pub struct TestApp {
  pub store: Arc<MemoryStore>,
  pub state: AppState,
}

pub fn test_app() -> TestApp {
  test_app_with(seeded_store(), memory_cache())
}

pub fn test_app_with(store: MemoryStore, cache: Arc<dyn CacheStore<OrderDetail>>) -> TestApp {
  setup_tracing();
  let store = Arc::new(store);
  let state = AppState::new(store.clone(), cache, test_config(&[]));
  TestApp { store, state }
}

/// A cache whose backend is down: every call fails.
pub struct UnreachableCache;

#[async_trait]
impl CacheStore<OrderDetail> for UnreachableCache {
  async fn get(&self, _key: &str) -> Result<Option<OrderDetail>, CacheError> {
    Err(CacheError::Unavailable("connection refused".into()))
  }

  async fn set(&self, _key: &str, _value: OrderDetail, _ttl: Duration) -> Result<(), CacheError> {
    Err(CacheError::Unavailable("connection refused".into()))
  }

  async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
    Err(CacheError::Unavailable("connection refused".into()))
  }
}

/// Wraps a `MemoryStore` and stalls for `delay` before every order write.
/// Reads go straight through.
pub struct SlowOrderStore {
  pub inner: Arc<MemoryStore>,
  pub delay: Duration,
}

#[async_trait]
impl ShippingCatalog for SlowOrderStore {
  async fn active_shipping_methods(&self) -> StoreResult<Vec<ShippingMethod>> {
    self.inner.active_shipping_methods().await
  }

  async fn shipping_method(&self, id: i64) -> StoreResult<Option<ShippingMethod>> {
    self.inner.shipping_method(id).await
  }
}

#[async_trait]
impl SellerPolicies for SlowOrderStore {
  async fn seller_policies(&self, seller_ids: &[i64]) -> StoreResult<Vec<SellerShippingPolicy>> {
    self.inner.seller_policies(seller_ids).await
  }

  async fn seller_policy(&self, seller_id: i64) -> StoreResult<Option<SellerShippingPolicy>> {
    self.inner.seller_policy(seller_id).await
  }

  async fn upsert_seller_policy(&self, policy: &SellerShippingPolicy) -> StoreResult<SellerShippingPolicy> {
    self.inner.upsert_seller_policy(policy).await
  }
}

#[async_trait]
impl OrderStore for SlowOrderStore {
  async fn insert_order_batch(&self, batch: &NewOrderBatch) -> StoreResult<Vec<i64>> {
    tokio::time::sleep(self.delay).await;
    self.inner.insert_order_batch(batch).await
  }

  async fn order_detail(&self, order_id: i64) -> StoreResult<Option<OrderDetail>> {
    self.inner.order_detail(order_id).await
  }

  async fn list_orders(&self, query: &OrderQuery) -> StoreResult<PageResult<OrderSummary>> {
    self.inner.list_orders(query).await
  }
}

#[async_trait]
impl StoreHealth for SlowOrderStore {
  async fn ping(&self) -> StoreResult<()> {
    self.inner.ping().await
  }
}

/// An app whose order writes take `delay`, with the request timeout set to
/// `timeout_secs`.
pub fn slow_checkout_app(delay: Duration, timeout_secs: u64) -> TestApp {
  setup_tracing();
  let store = Arc::new(seeded_store());
  let slow = Arc::new(SlowOrderStore {
    inner: store.clone(),
    delay,
  });
  let timeout = timeout_secs.to_string();
  let config = test_config(&[("REQUEST_TIMEOUT_SECS", timeout.as_str())]);
  let state = AppState::new(slow, memory_cache(), config);
  TestApp { store, state }
}
