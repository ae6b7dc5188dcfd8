// marketplace/src/lib.rs

//! Marketplace checkout service: order placement with per-line tax
//! apportionment, shipping quotes by seller policy, and cached order reads,
//! served over actix-web with each workflow run as an Orka pipeline.

pub mod config;
pub mod errors;
pub mod models;
pub mod money;
pub mod pipelines;
pub mod services;
pub mod shipping;
pub mod state;
pub mod store;
pub mod web;

pub use errors::{AppError, Result};
pub use state::AppState;
