// marketplace/src/models/mod.rs

//! Request, read and write models for checkout, shipping and orders.

pub mod cart;
pub mod listing;
pub mod order;
pub mod order_item;
pub mod shipping;

pub use cart::CartItem;
pub use listing::Listing;
pub use order::{
  NewOrderBatch, NewOrderLine, Order, OrderDetail, OrderLineRequest, OrderStatus, OrderSummary, PlaceOrderRequest,
  ShippingInfo,
};
pub use order_item::OrderItem;
pub use shipping::{SellerPolicyUpdate, SellerShippingPolicy, ShippingMethod, ShippingProvider, ShippingQuoteRequest};
