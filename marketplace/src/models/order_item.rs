// marketplace/src/models/order_item.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Created alongside its order and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: i64,
  pub order_id: i64,
  pub listing_id: i64,
  pub quantity: i32,
  /// Unit price at purchase.
  pub price: Decimal,
}
