// marketplace/src/models/shipping.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};

use super::cart::CartItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "shipping_provider")]
pub enum ShippingProvider {
  #[sqlx(rename = "USPS")]
  #[serde(rename = "USPS")]
  Usps,
  #[sqlx(rename = "UPS")]
  #[serde(rename = "UPS")]
  Ups,
  #[sqlx(rename = "FedEx")]
  #[serde(rename = "FedEx")]
  FedEx,
  #[sqlx(rename = "other")]
  #[serde(rename = "other")]
  Other,
}

impl ShippingProvider {
  pub fn estimated_delivery_days(self) -> Option<u32> {
    match self {
      ShippingProvider::Usps => Some(3),
      ShippingProvider::Ups => Some(2),
      ShippingProvider::FedEx => Some(1),
      ShippingProvider::Other => None,
    }
  }
}

/// Catalog entry managed by administrators; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShippingMethod {
  pub id: i64,
  pub name: String,
  pub provider: ShippingProvider,
  pub service_code: String,
  pub display_name: String,
  pub is_active: bool,
}

/// Per-seller shipping rules, stored on the seller's profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SellerShippingPolicy {
  pub seller_id: i64,
  pub offers_free_shipping: bool,
  pub standard_shipping_fee: Decimal,
  pub uses_calculated_shipping: bool,
  pub policy_text: Option<String>,
}

impl SellerShippingPolicy {
  /// Policy assumed for a seller without a profile row.
  pub fn defaults_for(seller_id: i64) -> Self {
    Self {
      seller_id,
      offers_free_shipping: false,
      standard_shipping_fee: Decimal::ZERO,
      uses_calculated_shipping: false,
      policy_text: None,
    }
  }
}

/// Body of `POST /shipping/calculate`. `to_zipcode` is carried through
/// untouched; destinations are not priced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingQuoteRequest {
  #[serde(default)]
  pub items: Option<Vec<CartItem>>,
  #[serde(default, alias = "shippingMethodId")]
  pub shipping_method_id: Option<i64>,
  #[serde(default, alias = "toZipcode")]
  pub to_zipcode: Option<String>,
}

/// Body of `PUT /shipping/policy/{seller_id}`. Omitted flags reset to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SellerPolicyUpdate {
  #[serde(default, alias = "offersFreeShipping")]
  pub offers_free_shipping: bool,
  #[serde(default, alias = "standardShippingFee")]
  pub standard_shipping_fee: Decimal,
  #[serde(default, alias = "usesCalculatedShipping")]
  pub uses_calculated_shipping: bool,
  #[serde(default, alias = "policyText")]
  pub policy_text: Option<String>,
}

impl SellerPolicyUpdate {
  pub fn validate(&self) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    if self.standard_shipping_fee < Decimal::ZERO {
      errors.push("standard_shipping_fee must not be negative".to_string());
    }
    if self.standard_shipping_fee.normalize().scale() > 2 {
      errors.push("standard_shipping_fee must have at most 2 decimal places".to_string());
    }
    if self.policy_text.as_ref().is_some_and(|t| t.chars().count() > 5000) {
      errors.push("policy_text must be at most 5000 characters".to_string());
    }
    if errors.is_empty() {
      Ok(())
    } else {
      Err(errors)
    }
  }

  pub fn into_policy(self, seller_id: i64) -> SellerShippingPolicy {
    SellerShippingPolicy {
      seller_id,
      offers_free_shipping: self.offers_free_shipping,
      standard_shipping_fee: crate::money::round_money(self.standard_shipping_fee),
      uses_calculated_shipping: self.uses_calculated_shipping,
      policy_text: self.policy_text,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn provider_names_round_trip_through_json() {
    let json = serde_json::to_string(&ShippingProvider::FedEx).unwrap();
    assert_eq!(json, r#""FedEx""#);
    let parsed: ShippingProvider = serde_json::from_str(r#""other""#).unwrap();
    assert_eq!(parsed, ShippingProvider::Other);
    assert_eq!(ShippingProvider::Other.estimated_delivery_days(), None);
  }

  #[test]
  fn policy_update_rejects_negative_and_fractional_cent_fees() {
    let negative = SellerPolicyUpdate {
      standard_shipping_fee: dec!(-1.00),
      ..Default::default()
    };
    assert!(negative.validate().is_err());

    let fractional = SellerPolicyUpdate {
      standard_shipping_fee: dec!(4.999),
      ..Default::default()
    };
    assert!(fractional.validate().is_err());

    let fine = SellerPolicyUpdate {
      standard_shipping_fee: dec!(5.000),
      ..Default::default()
    };
    assert!(fine.validate().is_ok());
    assert_eq!(fine.into_policy(7).standard_shipping_fee.to_string(), "5.00");
  }
}
