// marketplace/src/pipelines/order_lookup_pipeline.rs

//! Single-order read: load through the order cache, then make sure the
//! caller is the buyer or an admin.

use orka::{ContextData, Orka, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::OrderLookupCtxData;
use crate::state::AppState;

pub const FETCH_ORDER_DETAIL: &str = "fetch_order_detail";
pub const AUTHORIZE_ORDER_ACCESS: &str = "authorize_order_access";

pub fn register_order_lookup_pipeline(orka_registry: &Arc<Orka<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<OrderLookupCtxData, AppError>::new(&[
    (FETCH_ORDER_DETAIL, false, None),
    (AUTHORIZE_ORDER_ACCESS, false, None),
  ]);

  p.on_root(FETCH_ORDER_DETAIL, fetch_order_detail);
  p.on_root(AUTHORIZE_ORDER_ACCESS, authorize_order_access);

  orka_registry.register_pipeline(p);
}

#[instrument(name = "lookup_step::fetch_order_detail", skip(ctx_data), err)]
async fn fetch_order_detail(ctx_data: ContextData<OrderLookupCtxData>) -> Result<PipelineControl, AppError> {
  let (reader, order_id) = ctx_data.with(|c| (c.app_state.orders.clone(), c.order_id));
  let detail = reader.get_order(order_id).await?;
  ctx_data.write().order = Some(detail);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "lookup_step::authorize_order_access", skip(ctx_data), err)]
async fn authorize_order_access(ctx_data: ContextData<OrderLookupCtxData>) -> Result<PipelineControl, AppError> {
  let guard = ctx_data.read();
  let buyer_id = guard
    .order
    .as_ref()
    .map(|o| o.buyer_id())
    .ok_or_else(|| AppError::Internal("Order missing before access check".to_string()))?;

  if !guard.viewer.can_access(buyer_id) {
    warn!(
      order_id = guard.order_id,
      viewer = guard.viewer.user_id,
      "Order access denied."
    );
    return Err(AppError::Forbidden("You do not have access to this order.".to_string()));
  }
  Ok(PipelineControl::Continue)
}
