// marketplace/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::OrderDetail;
use crate::pipelines;
use crate::services::{CacheStore, OrderReader};
use crate::store::MarketStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn MarketStore>,
  pub orders: Arc<OrderReader>,
  pub orka_instance: Arc<orka::Orka<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the shared services and registers every pipeline.
  pub fn new(store: Arc<dyn MarketStore>, cache: Arc<dyn CacheStore<OrderDetail>>, config: AppConfig) -> Self {
    let orders = Arc::new(OrderReader::new(store.clone(), cache, config.order_cache.ttl));
    let orka_instance = Arc::new(orka::Orka::<AppError>::new());
    let app_state = AppState {
      store,
      orders,
      orka_instance: orka_instance.clone(),
      config: Arc::new(config),
    };
    pipelines::register_all_pipelines(&orka_instance, &app_state);
    tracing::info!("Orka pipelines registered.");
    app_state
  }
}
