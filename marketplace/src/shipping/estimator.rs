// marketplace/src/shipping/estimator.rs

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::policy::{resolve_charge, ChargeBasis, ShippingCharge};
use super::rates::ShippingConfig;
use crate::models::cart::{MAX_ITEM_QUANTITY, MAX_ITEM_WEIGHT_OZ};
use crate::models::{CartItem, SellerShippingPolicy, ShippingMethod, ShippingProvider};
use crate::money::{checked_sum, round_money, AmountOverflow};

/// Items of one seller, shipped together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerGroup {
  pub seller_id: i64,
  pub items: Vec<CartItem>,
}

impl SellerGroup {
  pub fn total_weight_oz(&self) -> Result<Decimal, AmountOverflow> {
    let weights = self
      .items
      .iter()
      .map(CartItem::line_weight_oz)
      .collect::<Result<Vec<_>, _>>()?;
    checked_sum(weights)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerBreakdown {
  pub seller_id: i64,
  pub item_count: usize,
  pub free_shipping: bool,
  pub shipping_cost: Decimal,
  pub charge_basis: ChargeBasis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingEstimate {
  pub shipping_method_id: i64,
  pub provider: ShippingProvider,
  pub service: String,
  pub cost: Decimal,
  pub estimated_delivery_days: Option<u32>,
  pub breakdown: Vec<SellerBreakdown>,
}

/// Checks every item and reports all problems at once.
pub fn validate_items(items: &[CartItem]) -> Result<(), Vec<String>> {
  if items.is_empty() {
    return Err(vec!["At least one item is required".to_string()]);
  }
  let mut errors = Vec::new();
  for (idx, item) in items.iter().enumerate() {
    let label = match item.listing_id {
      Some(listing_id) => format!("Item {} (listing {})", idx, listing_id),
      None => format!("Item {}", idx),
    };
    if item.seller_id.is_none() {
      errors.push(format!("{} is missing sellerId", label));
    }
    if item.quantity == 0 {
      errors.push(format!("{}: quantity must be at least 1", label));
    } else if item.quantity > MAX_ITEM_QUANTITY {
      errors.push(format!("{}: quantity must not exceed {}", label, MAX_ITEM_QUANTITY));
    }
    match item.weight_ounces {
      Some(w) if w < Decimal::ZERO => errors.push(format!("{}: weightOunces must not be negative", label)),
      Some(w) if w > MAX_ITEM_WEIGHT_OZ => errors.push(format!(
        "{}: weightOunces must not exceed {}",
        label, MAX_ITEM_WEIGHT_OZ
      )),
      _ => {}
    }
  }
  if errors.is_empty() {
    Ok(())
  } else {
    Err(errors)
  }
}

/// Groups items by seller. Groups come out in the order their seller first
/// appears; items without a seller are skipped, so validate first.
pub fn group_by_seller(items: &[CartItem]) -> Vec<SellerGroup> {
  let mut groups: IndexMap<i64, Vec<CartItem>> = IndexMap::new();
  for item in items {
    if let Some(seller_id) = item.seller_id {
      groups.entry(seller_id).or_default().push(item.clone());
    }
  }
  groups
    .into_iter()
    .map(|(seller_id, items)| SellerGroup { seller_id, items })
    .collect()
}

/// Prices every group with its seller's policy (defaults when missing) and
/// sums the result. Fails only when a weight or cost leaves `Decimal`'s range.
pub fn price_groups(
  method: &ShippingMethod,
  groups: &[SellerGroup],
  policies: &HashMap<i64, SellerShippingPolicy>,
  config: &ShippingConfig,
) -> Result<ShippingEstimate, AmountOverflow> {
  let rate = config.rates.for_provider(method.provider);

  let breakdown = groups
    .iter()
    .map(|group| {
      let charge = match policies.get(&group.seller_id) {
        Some(policy) => resolve_charge(policy),
        None => resolve_charge(&SellerShippingPolicy::defaults_for(group.seller_id)),
      };
      let cost = round_money(charge.cost(group.total_weight_oz()?, rate, config.fallback)?);
      tracing::debug!(
        seller_id = group.seller_id,
        basis = ?charge.basis(),
        %cost,
        "Priced seller group"
      );
      Ok(SellerBreakdown {
        seller_id: group.seller_id,
        item_count: group.items.len(),
        free_shipping: matches!(charge, ShippingCharge::Free),
        shipping_cost: cost,
        charge_basis: charge.basis(),
      })
    })
    .collect::<Result<Vec<_>, AmountOverflow>>()?;

  let total = checked_sum(breakdown.iter().map(|b| b.shipping_cost))?;

  Ok(ShippingEstimate {
    shipping_method_id: method.id,
    provider: method.provider,
    service: method.display_name.clone(),
    cost: round_money(total),
    estimated_delivery_days: method.provider.estimated_delivery_days(),
    breakdown,
  })
}
