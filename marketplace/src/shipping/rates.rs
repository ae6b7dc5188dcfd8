// marketplace/src/shipping/rates.rs

//! Weight-banded carrier rates.
//!
//! A `CarrierRate` prices a parcel by weight in ounces:
//! up to 16 oz costs `first_pound`, up to 32 oz costs `second_pound`, and each
//! started 16 oz beyond that adds `per_extra_pound`.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::shipping::ShippingProvider;
use crate::money::AmountOverflow;

const OUNCES_PER_POUND: Decimal = Decimal::from_parts(16, 0, 0, false, 0);
const TWO_POUNDS_OZ: Decimal = Decimal::from_parts(32, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierRate {
  pub first_pound: Decimal,
  pub second_pound: Decimal,
  pub per_extra_pound: Decimal,
}

impl CarrierRate {
  pub fn new(first_pound: Decimal, second_pound: Decimal, per_extra_pound: Decimal) -> Self {
    Self {
      first_pound,
      second_pound,
      per_extra_pound,
    }
  }

  /// Cost of shipping `weight_oz` ounces. Weights at or below zero are
  /// charged as the first band.
  pub fn quote(&self, weight_oz: Decimal) -> Result<Decimal, AmountOverflow> {
    if weight_oz <= OUNCES_PER_POUND {
      Ok(self.first_pound)
    } else if weight_oz <= TWO_POUNDS_OZ {
      Ok(self.second_pound)
    } else {
      let extra_pounds = ((weight_oz - TWO_POUNDS_OZ) / OUNCES_PER_POUND).ceil();
      extra_pounds
        .checked_mul(self.per_extra_pound)
        .and_then(|extra| self.second_pound.checked_add(extra))
        .ok_or(AmountOverflow)
    }
  }
}

/// Parses `"first,second,increment"`, e.g. `"4.50,5.50,1.50"`.
impl FromStr for CarrierRate {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
      return Err(format!("expected 'first,second,increment', got '{}'", s));
    }
    let mut values = [Decimal::ZERO; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
      let value = Decimal::from_str(part).map_err(|e| format!("invalid amount '{}': {}", part, e))?;
      if value.is_sign_negative() {
        return Err(format!("amount '{}' must not be negative", part));
      }
      *slot = value;
    }
    Ok(Self::new(values[0], values[1], values[2]))
  }
}

/// One rate per provider. Providers outside the named carriers use `other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
  pub usps: CarrierRate,
  pub ups: CarrierRate,
  pub fedex: CarrierRate,
  pub other: CarrierRate,
}

impl RateTable {
  pub fn for_provider(&self, provider: ShippingProvider) -> &CarrierRate {
    match provider {
      ShippingProvider::Usps => &self.usps,
      ShippingProvider::Ups => &self.ups,
      ShippingProvider::FedEx => &self.fedex,
      ShippingProvider::Other => &self.other,
    }
  }
}

impl Default for RateTable {
  fn default() -> Self {
    let usps = CarrierRate::new(Decimal::new(450, 2), Decimal::new(550, 2), Decimal::new(150, 2));
    Self {
      usps,
      ups: CarrierRate::new(Decimal::new(850, 2), Decimal::new(1050, 2), Decimal::new(200, 2)),
      fedex: CarrierRate::new(Decimal::new(950, 2), Decimal::new(1250, 2), Decimal::new(275, 2)),
      other: usps,
    }
  }
}

/// What a seller group pays when no policy rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackFee {
  /// Price the group by weight with the selected carrier's rate.
  #[default]
  CarrierRate,
  Flat(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShippingConfig {
  pub rates: RateTable,
  pub fallback: FallbackFee,
}
