// marketplace/src/web/handlers/shipping_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::instrument;

use super::run_workflow;
use crate::errors::AppError;
use crate::models::ShippingQuoteRequest;
use crate::pipelines::contexts::ShippingQuoteCtxData;
use crate::state::AppState;
use crate::store::ShippingCatalog;
use orka::ContextData;

#[instrument(name = "handler::calculate_shipping", skip(app_state, req_payload))]
pub async fn calculate_shipping_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<ShippingQuoteRequest>,
) -> Result<HttpResponse, AppError> {
  let ctx_data = ContextData::new(ShippingQuoteCtxData::new(
    app_state.get_ref().clone(),
    req_payload.into_inner(),
  ));

  run_workflow(&app_state, ctx_data.clone()).await?;

  let estimate = ctx_data
    .write()
    .estimate
    .take()
    .ok_or_else(|| AppError::Internal("Shipping quote completed without an estimate.".to_string()))?;
  Ok(HttpResponse::Ok().json(estimate))
}

#[instrument(name = "handler::list_shipping_methods", skip(app_state))]
pub async fn list_shipping_methods_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let methods = app_state.store.active_shipping_methods().await?;
  Ok(HttpResponse::Ok().json(methods))
}
