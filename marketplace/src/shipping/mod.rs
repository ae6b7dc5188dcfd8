// marketplace/src/shipping/mod.rs

//! Shipping cost estimation: carrier rate tables, seller policy precedence
//! and the per-seller estimator.

pub mod estimator;
pub mod policy;
pub mod rates;

pub use estimator::{group_by_seller, price_groups, validate_items, SellerBreakdown, SellerGroup, ShippingEstimate};
pub use policy::{resolve_charge, ChargeBasis, ShippingCharge};
pub use rates::{CarrierRate, FallbackFee, RateTable, ShippingConfig};
