// marketplace/src/models/cart.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::AmountOverflow;

/// Parcel weight assumed for a unit whose listing has no weight on record.
pub const DEFAULT_ITEM_WEIGHT_OZ: Decimal = Decimal::from_parts(4, 0, 0, false, 0);

/// Most units of one listing a single cart line may carry.
pub const MAX_ITEM_QUANTITY: u32 = 10_000;

/// Heaviest unit weight accepted for a quote: 2,500 lb.
pub const MAX_ITEM_WEIGHT_OZ: Decimal = Decimal::from_parts(40_000, 0, 0, false, 0);

/// One line of a buyer's cart as sent for a shipping quote.
///
/// Accepts both `sellerId` and `seller_id` spellings (and likewise for the
/// other multi-word fields) since quote requests arrive in snake_case while the
/// cart itself is camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  #[serde(default, alias = "listing_id", alias = "id")]
  pub listing_id: Option<i64>,
  #[serde(default, alias = "unit_price", alias = "price")]
  pub unit_price: Option<Decimal>,
  #[serde(default = "default_quantity")]
  pub quantity: u32,
  #[serde(default, alias = "seller_id")]
  pub seller_id: Option<i64>,
  #[serde(default, alias = "weight_ounces")]
  pub weight_ounces: Option<Decimal>,
}

fn default_quantity() -> u32 {
  1
}

impl CartItem {
  pub fn unit_weight_oz(&self) -> Decimal {
    self.weight_ounces.unwrap_or(DEFAULT_ITEM_WEIGHT_OZ)
  }

  /// Weight of the whole line: per-unit weight times quantity.
  pub fn line_weight_oz(&self) -> Result<Decimal, AmountOverflow> {
    self
      .unit_weight_oz()
      .checked_mul(Decimal::from(self.quantity))
      .ok_or(AmountOverflow)
  }
}
