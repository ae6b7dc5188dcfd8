// marketplace/src/models/listing.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The slice of a listing that order reads join in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
  pub id: i64,
  pub seller_id: i64,
  pub title: String,
  pub image_url: Option<String>,
  pub price: Decimal,
}
