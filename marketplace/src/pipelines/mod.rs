// marketplace/src/pipelines/mod.rs

//! Defines and registers the Orka pipelines behind the HTTP workflows.

use crate::errors::AppError;
use crate::state::AppState;
use orka::Orka;
use std::sync::Arc;

pub mod contexts;

pub mod order_lookup_pipeline;
pub mod order_pipeline;
pub mod shipping_pipeline;

/// Registers every pipeline with `orka_instance`. Called once at startup.
pub fn register_all_pipelines(orka_instance: &Arc<Orka<AppError>>, app_state: &AppState) {
  tracing::info!("Registering Orka pipelines...");

  order_pipeline::register_place_order_pipeline(orka_instance, app_state);
  shipping_pipeline::register_shipping_quote_pipeline(orka_instance, app_state);
  order_lookup_pipeline::register_order_lookup_pipeline(orka_instance, app_state);

  tracing::info!("All application pipelines registered with Orka.");
}
