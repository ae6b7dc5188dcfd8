// marketplace/src/pipelines/contexts.rs

//! Root data for each Orka pipeline. Handlers receive these wrapped in
//! `orka::ContextData` and write their results back into them.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::{
  NewOrderBatch, OrderDetail, PlaceOrderRequest, SellerShippingPolicy, ShippingMethod, ShippingQuoteRequest,
};
use crate::money::{BatchTotals, LineInput};
use crate::shipping::{SellerGroup, ShippingEstimate};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

/// A request line that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedLine {
  pub listing_id: i64,
  pub quantity: i32,
  pub input: LineInput,
}

#[derive(Clone)]
pub struct PlaceOrderCtxData {
  pub app_state: AppState,
  pub buyer_id: i64,
  pub request: PlaceOrderRequest,

  // Set by validate_order_request
  pub lines: Vec<ValidatedLine>,
  pub tax_rate: Decimal,
  pub payment_id: Option<String>,
  pub totals: Option<BatchTotals>,

  // Set by apportion_line_amounts
  pub batch: Option<NewOrderBatch>,

  // Set by persist_order_batch
  pub order_ids: Vec<i64>,
}

impl PlaceOrderCtxData {
  pub fn new(app_state: AppState, buyer_id: i64, request: PlaceOrderRequest) -> Self {
    Self {
      app_state,
      buyer_id,
      request,
      lines: Vec::new(),
      tax_rate: Decimal::ZERO,
      payment_id: None,
      totals: None,
      batch: None,
      order_ids: Vec::new(),
    }
  }
}

#[derive(Clone)]
pub struct ShippingQuoteCtxData {
  pub app_state: AppState,
  pub request: ShippingQuoteRequest,
  pub groups: Vec<SellerGroup>,
  pub method: Option<ShippingMethod>,
  pub policies: HashMap<i64, SellerShippingPolicy>,
  pub estimate: Option<ShippingEstimate>,
}

impl ShippingQuoteCtxData {
  pub fn new(app_state: AppState, request: ShippingQuoteRequest) -> Self {
    Self {
      app_state,
      request,
      groups: Vec::new(),
      method: None,
      policies: HashMap::new(),
      estimate: None,
    }
  }
}

#[derive(Clone)]
pub struct OrderLookupCtxData {
  pub app_state: AppState,
  pub order_id: i64,
  pub viewer: AuthenticatedUser,
  pub order: Option<OrderDetail>,
}

impl OrderLookupCtxData {
  pub fn new(app_state: AppState, order_id: i64, viewer: AuthenticatedUser) -> Self {
    Self {
      app_state,
      order_id,
      viewer,
      order: None,
    }
  }
}
