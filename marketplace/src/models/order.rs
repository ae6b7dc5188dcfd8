// marketplace/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type as SqlxType};

use super::order_item::OrderItem;
use crate::money::LineAmounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Shipped,
  Delivered,
  Cancelled,
  Refunded,
}

impl std::str::FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pending" => Ok(OrderStatus::Pending),
      "paid" => Ok(OrderStatus::Paid),
      "shipped" => Ok(OrderStatus::Shipped),
      "delivered" => Ok(OrderStatus::Delivered),
      "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
      "refunded" => Ok(OrderStatus::Refunded),
      other => Err(format!("unknown order status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  #[serde(default)]
  pub full_name: Option<String>,
  #[serde(default)]
  pub line1: Option<String>,
  #[serde(default)]
  pub line2: Option<String>,
  #[serde(default)]
  pub city: Option<String>,
  #[serde(default)]
  pub state: Option<String>,
  #[serde(default)]
  pub postal_code: Option<String>,
  #[serde(default)]
  pub country: Option<String>,
}

/// Destination and chosen method, stored as JSONB on every order row of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
  #[serde(default)]
  pub address: Option<ShippingAddress>,
  #[serde(default)]
  pub method: Option<String>,
  #[serde(default)]
  pub shipping_method_id: Option<i64>,
  #[serde(default)]
  pub cost: Option<Decimal>,
}

/// One purchased cart line. A checkout creates one `Order` per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: i64,
  pub buyer_id: i64,
  pub listing_id: i64,
  /// Line subtotal plus its share of the batch tax.
  pub price_at_purchase: Decimal,
  pub subtotal: Decimal,
  pub tax_amount: Decimal,
  pub tax_rate: Decimal,
  pub payment_id: Option<String>,
  pub status: OrderStatus,
  pub shipping_info: Option<Json<ShippingInfo>>,
  pub is_paid: bool,
  pub created_at: DateTime<Utc>,
}

/// An order joined with its listing's title and image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub order: Order,
  pub listing_title: Option<String>,
  pub listing_image: Option<String>,
}

/// The shape returned by `GET /orders/{id}` and kept in the order cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
  #[serde(flatten)]
  pub summary: OrderSummary,
  pub items: Vec<OrderItem>,
}

impl OrderDetail {
  pub fn buyer_id(&self) -> i64 {
    self.summary.order.buyer_id
  }
}

// --- Checkout request ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
  #[serde(default, alias = "listingId")]
  pub id: Option<i64>,
  #[serde(default)]
  pub price: Option<Decimal>,
  #[serde(default)]
  pub quantity: Option<i64>,
}

/// Body of `POST /orders`. `subtotal`, `tax` and `total` are optional; when
/// sent they are checked against the server's own figures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
  #[serde(default)]
  pub items: Option<Vec<OrderLineRequest>>,
  #[serde(default)]
  pub shipping_info: Option<ShippingInfo>,
  #[serde(default)]
  pub payment_id: Option<String>,
  #[serde(default)]
  pub subtotal: Option<Decimal>,
  #[serde(default)]
  pub tax: Option<Decimal>,
  #[serde(default)]
  pub total: Option<Decimal>,
  #[serde(default)]
  pub tax_rate: Option<Decimal>,
}

// --- Write model ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
  pub listing_id: i64,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub amounts: LineAmounts,
}

/// Everything one checkout writes. Lines keep the request's item order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderBatch {
  pub buyer_id: i64,
  pub tax_rate: Decimal,
  pub payment_id: Option<String>,
  pub shipping_info: Option<ShippingInfo>,
  pub lines: Vec<NewOrderLine>,
}

impl NewOrderBatch {
  pub fn is_paid(&self) -> bool {
    self.payment_id.is_some()
  }
}
