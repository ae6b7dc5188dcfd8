// marketplace/src/pipelines/shipping_pipeline.rs

//! Shipping quote: check the items, resolve the method, load seller
//! policies, then price each seller group.

use orka::{ContextData, Orka, Pipeline, PipelineControl};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::errors::AppError;
use crate::models::ShippingQuoteRequest;
use crate::pipelines::contexts::ShippingQuoteCtxData;
use crate::shipping::{self, SellerGroup};
use crate::state::AppState;
use crate::store::{SellerPolicies, ShippingCatalog};

pub const VALIDATE_QUOTE_REQUEST: &str = "validate_quote_request";
pub const RESOLVE_SHIPPING_METHOD: &str = "resolve_shipping_method";
pub const LOAD_SELLER_POLICIES: &str = "load_seller_policies";
pub const PRICE_SELLER_GROUPS: &str = "price_seller_groups";

pub fn register_shipping_quote_pipeline(orka_registry: &Arc<Orka<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<ShippingQuoteCtxData, AppError>::new(&[
    (VALIDATE_QUOTE_REQUEST, false, None),
    (RESOLVE_SHIPPING_METHOD, false, None),
    (LOAD_SELLER_POLICIES, false, None),
    (PRICE_SELLER_GROUPS, false, None),
  ]);

  p.on_root(VALIDATE_QUOTE_REQUEST, validate_quote_request);
  p.on_root(RESOLVE_SHIPPING_METHOD, resolve_shipping_method);
  p.on_root(LOAD_SELLER_POLICIES, load_seller_policies);
  p.on_root(PRICE_SELLER_GROUPS, price_seller_groups);

  orka_registry.register_pipeline(p);
}

/// Groups the request's items by seller, or lists everything wrong with it.
pub fn validate_quote(request: &ShippingQuoteRequest) -> Result<Vec<SellerGroup>, Vec<String>> {
  let mut errors = Vec::new();
  match &request.items {
    None => errors.push("items must be an array".to_string()),
    Some(items) => {
      if let Err(item_errors) = shipping::validate_items(items) {
        errors.extend(item_errors);
      }
    }
  }
  if request.shipping_method_id.is_none() {
    errors.push("shipping_method_id is required".to_string());
  }
  if !errors.is_empty() {
    return Err(errors);
  }
  Ok(shipping::group_by_seller(request.items.as_deref().unwrap_or_default()))
}

#[instrument(name = "shipping_step::validate_quote_request", skip(ctx_data), err)]
pub async fn validate_quote_request(ctx_data: ContextData<ShippingQuoteCtxData>) -> Result<PipelineControl, AppError> {
  let groups = ctx_data
    .with(|c| validate_quote(&c.request))
    .map_err(|errors| AppError::validation("Invalid shipping request", errors))?;
  debug!(sellers = groups.len(), "Grouped items by seller.");
  ctx_data.write().groups = groups;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "shipping_step::resolve_shipping_method", skip(ctx_data), err)]
pub async fn resolve_shipping_method(ctx_data: ContextData<ShippingQuoteCtxData>) -> Result<PipelineControl, AppError> {
  let (store, method_id) = ctx_data.with(|c| (c.app_state.store.clone(), c.request.shipping_method_id));
  let method_id = method_id.ok_or_else(|| AppError::invalid("shipping_method_id is required"))?;

  let method = store
    .shipping_method(method_id)
    .await?
    .filter(|m| m.is_active)
    .ok_or_else(|| AppError::NotFound(format!("Shipping method {} not found", method_id)))?;

  ctx_data.write().method = Some(method);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "shipping_step::load_seller_policies", skip(ctx_data), err)]
pub async fn load_seller_policies(ctx_data: ContextData<ShippingQuoteCtxData>) -> Result<PipelineControl, AppError> {
  let (store, seller_ids) = ctx_data.with(|c| {
    let ids: Vec<i64> = c.groups.iter().map(|g| g.seller_id).collect();
    (c.app_state.store.clone(), ids)
  });

  let policies: HashMap<i64, _> = store
    .seller_policies(&seller_ids)
    .await?
    .into_iter()
    .map(|policy| (policy.seller_id, policy))
    .collect();
  debug!(
    sellers = seller_ids.len(),
    with_policy = policies.len(),
    "Loaded seller shipping policies."
  );

  ctx_data.write().policies = policies;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "shipping_step::price_seller_groups", skip(ctx_data), err)]
pub async fn price_seller_groups(ctx_data: ContextData<ShippingQuoteCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  let method = guard
    .method
    .clone()
    .ok_or_else(|| AppError::Internal("Shipping method missing before pricing".to_string()))?;

  let estimate = shipping::price_groups(&method, &guard.groups, &guard.policies, &guard.app_state.config.shipping)
    .map_err(|e| AppError::invalid(format!("Shipping cost could not be computed: {}", e)))?;
  info!(
    shipping_method_id = method.id,
    cost = %estimate.cost,
    sellers = estimate.breakdown.len(),
    "Shipping estimate computed."
  );
  guard.estimate = Some(estimate);
  Ok(PipelineControl::Continue)
}
