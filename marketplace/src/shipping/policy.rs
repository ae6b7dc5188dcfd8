// marketplace/src/shipping/policy.rs

//! Which charge applies to a seller group.
//!
//! The rules are tried in `PRECEDENCE` order and the first match wins; a
//! group matching none of them pays the fallback.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::rates::{CarrierRate, FallbackFee};
use crate::money::AmountOverflow;
use crate::models::SellerShippingPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingCharge {
  Free,
  FlatFee(Decimal),
  Calculated,
  Fallback,
}

/// The rule that priced a group, reported in the quote breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeBasis {
  Free,
  FlatFee,
  Calculated,
  Fallback,
}

type ChargeRule = fn(&SellerShippingPolicy) -> Option<ShippingCharge>;

const PRECEDENCE: &[ChargeRule] = &[free_shipping, flat_fee, calculated_by_weight];

fn free_shipping(policy: &SellerShippingPolicy) -> Option<ShippingCharge> {
  policy.offers_free_shipping.then_some(ShippingCharge::Free)
}

fn flat_fee(policy: &SellerShippingPolicy) -> Option<ShippingCharge> {
  (policy.standard_shipping_fee > Decimal::ZERO).then_some(ShippingCharge::FlatFee(policy.standard_shipping_fee))
}

fn calculated_by_weight(policy: &SellerShippingPolicy) -> Option<ShippingCharge> {
  policy.uses_calculated_shipping.then_some(ShippingCharge::Calculated)
}

pub fn resolve_charge(policy: &SellerShippingPolicy) -> ShippingCharge {
  PRECEDENCE
    .iter()
    .find_map(|rule| rule(policy))
    .unwrap_or(ShippingCharge::Fallback)
}

impl ShippingCharge {
  pub fn basis(&self) -> ChargeBasis {
    match self {
      ShippingCharge::Free => ChargeBasis::Free,
      ShippingCharge::FlatFee(_) => ChargeBasis::FlatFee,
      ShippingCharge::Calculated => ChargeBasis::Calculated,
      ShippingCharge::Fallback => ChargeBasis::Fallback,
    }
  }

  /// Unrounded cost for a group weighing `weight_oz`.
  pub fn cost(&self, weight_oz: Decimal, rate: &CarrierRate, fallback: FallbackFee) -> Result<Decimal, AmountOverflow> {
    match self {
      ShippingCharge::Free => Ok(Decimal::ZERO),
      ShippingCharge::FlatFee(fee) => Ok(*fee),
      ShippingCharge::Calculated => rate.quote(weight_oz),
      ShippingCharge::Fallback => match fallback {
        FallbackFee::CarrierRate => rate.quote(weight_oz),
        FallbackFee::Flat(fee) => Ok(fee),
      },
    }
  }
}
