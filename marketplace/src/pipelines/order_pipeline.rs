// marketplace/src/pipelines/order_pipeline.rs

//! Checkout: validate the cart, split the batch tax across its lines, then
//! write one order and one order item per line in a single transaction.

use orka::{ContextData, Orka, Pipeline, PipelineControl};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::errors::AppError;
use crate::models::cart::MAX_ITEM_QUANTITY;
use crate::models::{NewOrderBatch, NewOrderLine, PlaceOrderRequest};
use crate::money::{self, BatchTotals, LineInput, MAX_AMOUNT, TAX_RATE_SCALE};
use crate::pipelines::contexts::{PlaceOrderCtxData, ValidatedLine};
use crate::state::AppState;
use crate::store::OrderStore;

pub const VALIDATE_ORDER_REQUEST: &str = "validate_order_request";
pub const APPORTION_LINE_AMOUNTS: &str = "apportion_line_amounts";
pub const PERSIST_ORDER_BATCH: &str = "persist_order_batch";

pub fn register_place_order_pipeline(orka_registry: &Arc<Orka<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<PlaceOrderCtxData, AppError>::new(&[
    (VALIDATE_ORDER_REQUEST, false, None),
    (APPORTION_LINE_AMOUNTS, false, None),
    (PERSIST_ORDER_BATCH, false, None),
  ]);

  p.on_root(VALIDATE_ORDER_REQUEST, validate_order_request);
  p.on_root(APPORTION_LINE_AMOUNTS, apportion_line_amounts);
  p.on_root(PERSIST_ORDER_BATCH, persist_order_batch);
  p.after_root(PERSIST_ORDER_BATCH, |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let (buyer_id, order_ids, total) = ctx_data.with(|c| (c.buyer_id, c.order_ids.clone(), c.totals.map(|t| t.total)));
    info!(buyer_id, ?order_ids, total = ?total, "Order batch placed.");
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  orka_registry.register_pipeline(p);
}

/// Result of checking a `PlaceOrderRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
  pub lines: Vec<ValidatedLine>,
  pub tax_rate: Decimal,
  pub payment_id: Option<String>,
  pub totals: BatchTotals,
}

/// Checks the whole request and returns every violation, not just the first.
///
/// Client-sent `subtotal`, `tax` and `total` are optional, but when present
/// they must equal the server's figures to the cent.
pub fn validate_order(buyer_id: i64, request: &PlaceOrderRequest) -> Result<ValidatedOrder, Vec<String>> {
  let mut errors = Vec::new();

  if buyer_id <= 0 {
    errors.push("buyerId is required".to_string());
  }

  let mut lines = Vec::new();
  match &request.items {
    None => errors.push("Items must be an array".to_string()),
    Some(items) if items.is_empty() => errors.push("Order must contain at least one item".to_string()),
    Some(items) => {
      for (idx, item) in items.iter().enumerate() {
        let id = match item.id {
          None => {
            errors.push(format!("Item {}: id is required", idx));
            None
          }
          Some(id) if id <= 0 => {
            errors.push(format!("Item {}: id must be a positive integer", idx));
            None
          }
          Some(id) => Some(id),
        };

        let price = match item.price {
          None => {
            errors.push(format!("Item {}: price is required", idx));
            None
          }
          Some(p) if p < Decimal::ZERO => {
            errors.push(format!("Item {}: price must not be negative", idx));
            None
          }
          Some(p) if p.normalize().scale() > 2 => {
            errors.push(format!("Item {}: price must have at most 2 decimal places", idx));
            None
          }
          Some(p) if p > MAX_AMOUNT => {
            errors.push(format!("Item {}: price must not exceed {}", idx, MAX_AMOUNT));
            None
          }
          Some(p) => Some(p),
        };

        let quantity = match item.quantity {
          None => {
            errors.push(format!("Item {}: quantity is required", idx));
            None
          }
          Some(q) if q < 1 => {
            errors.push(format!("Item {}: quantity must be at least 1", idx));
            None
          }
          Some(q) if q > i64::from(MAX_ITEM_QUANTITY) => {
            errors.push(format!("Item {}: quantity must not exceed {}", idx, MAX_ITEM_QUANTITY));
            None
          }
          Some(q) => i32::try_from(q).ok(),
        };

        if let (Some(listing_id), Some(unit_price), Some(quantity)) = (id, price, quantity) {
          lines.push(ValidatedLine {
            listing_id,
            quantity,
            input: LineInput {
              unit_price,
              quantity: quantity.unsigned_abs(),
            },
          });
        }
      }
    }
  }

  let tax_rate = request.tax_rate.unwrap_or(Decimal::ZERO);
  if tax_rate < Decimal::ZERO || tax_rate >= Decimal::ONE {
    errors.push("taxRate must be at least 0 and less than 1".to_string());
  } else if tax_rate.normalize().scale() > TAX_RATE_SCALE {
    errors.push(format!("taxRate must have at most {} decimal places", TAX_RATE_SCALE));
  }

  if !errors.is_empty() {
    return Err(errors);
  }

  let inputs: Vec<LineInput> = lines.iter().map(|l| l.input).collect();
  let too_large = |_| vec!["Order amounts are too large to compute".to_string()];
  let totals = BatchTotals::from_lines(&inputs, tax_rate).map_err(too_large)?;

  // Each line is stored as its own order, so every line total must fit the amount columns.
  let amounts = money::apportion(&inputs, totals.subtotal, totals.tax, tax_rate).map_err(too_large)?;
  for (idx, line) in amounts.iter().enumerate() {
    if line.total > MAX_AMOUNT {
      errors.push(format!(
        "Item {}: line total {} exceeds the maximum of {}",
        idx, line.total, MAX_AMOUNT
      ));
    }
  }
  if !errors.is_empty() {
    return Err(errors);
  }

  for (field, sent, computed) in [
    ("subtotal", request.subtotal, totals.subtotal),
    ("tax", request.tax, totals.tax),
    ("total", request.total, totals.total),
  ] {
    if let Some(sent) = sent {
      if money::round_money(sent) != computed {
        errors.push(format!(
          "{} {} does not match the computed {} {}",
          field,
          money::round_money(sent),
          field,
          computed
        ));
      }
    }
  }

  if !errors.is_empty() {
    return Err(errors);
  }

  let payment_id = request
    .payment_id
    .as_deref()
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .map(str::to_string);

  Ok(ValidatedOrder {
    lines,
    tax_rate,
    payment_id,
    totals,
  })
}

#[instrument(name = "order_step::validate_order_request", skip(ctx_data), err)]
pub async fn validate_order_request(ctx_data: ContextData<PlaceOrderCtxData>) -> Result<PipelineControl, AppError> {
  let outcome = ctx_data.with(|c| validate_order(c.buyer_id, &c.request));
  let validated = outcome.map_err(|errors| AppError::validation("Invalid order request", errors))?;

  ctx_data.update(|c| {
    c.lines = validated.lines;
    c.tax_rate = validated.tax_rate;
    c.payment_id = validated.payment_id;
    c.totals = Some(validated.totals);
  });
  Ok(PipelineControl::Continue)
}

#[instrument(name = "order_step::apportion_line_amounts", skip(ctx_data), err)]
pub async fn apportion_line_amounts(ctx_data: ContextData<PlaceOrderCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  let totals = guard
    .totals
    .ok_or_else(|| AppError::Internal("Batch totals missing before apportionment".to_string()))?;

  let inputs: Vec<LineInput> = guard.lines.iter().map(|l| l.input).collect();
  let amounts = money::apportion(&inputs, totals.subtotal, totals.tax, guard.tax_rate)
    .map_err(|e| AppError::invalid(format!("Order amounts could not be apportioned: {}", e)))?;

  let lines = guard
    .lines
    .iter()
    .zip(amounts)
    .map(|(line, amounts)| NewOrderLine {
      listing_id: line.listing_id,
      quantity: line.quantity,
      unit_price: money::round_money(line.input.unit_price),
      amounts,
    })
    .collect();

  let batch = NewOrderBatch {
    buyer_id: guard.buyer_id,
    tax_rate: guard.tax_rate,
    payment_id: guard.payment_id.clone(),
    shipping_info: guard.request.shipping_info.clone(),
    lines,
  };
  guard.batch = Some(batch);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "order_step::persist_order_batch", skip(ctx_data), err)]
pub async fn persist_order_batch(ctx_data: ContextData<PlaceOrderCtxData>) -> Result<PipelineControl, AppError> {
  let (store, batch) = {
    let guard = ctx_data.read();
    (guard.app_state.store.clone(), guard.batch.clone())
  }; // guard dropped
  let batch = batch.ok_or_else(|| AppError::Internal("Order batch missing before persistence".to_string()))?;

  let order_ids = store.insert_order_batch(&batch).await.map_err(|e| {
    error!(buyer_id = batch.buyer_id, error = %e, "Order batch was not persisted.");
    AppError::from(e)
  })?;

  ctx_data.write().order_ids = order_ids;
  Ok(PipelineControl::Continue)
}
