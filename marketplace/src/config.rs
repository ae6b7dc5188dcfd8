// marketplace/src/config.rs

use crate::errors::{AppError, Result};
use crate::shipping::rates::{CarrierRate, FallbackFee, RateTable, ShippingConfig};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
  Development,
  Production,
}

impl Environment {
  pub fn is_development(self) -> bool {
    matches!(self, Environment::Development)
  }
}

impl FromStr for Environment {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "development" | "dev" | "local" => Ok(Environment::Development),
      "production" | "prod" => Ok(Environment::Production),
      other => Err(format!("unknown environment '{}'", other)),
    }
  }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
  pub url: String,
  pub max_connections: u32,
  pub acquire_timeout: Duration,
  pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct OrderCacheConfig {
  pub ttl: Duration,
  pub capacity: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub environment: Environment,
  pub database: DatabaseConfig,
  /// Upper bound on a single checkout, quote or order lookup workflow.
  pub request_timeout: Duration,
  pub order_cache: OrderCacheConfig,
  pub shipping: ShippingConfig,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_source(|name| env::var(name).ok())
  }

  /// Builds the config from any key lookup. `from_env` passes the process
  /// environment; tests pass a closure over a fixed map.
  pub fn from_source<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_or(&lookup, "SERVER_PORT", 8080u16)?;
    let environment = parse_or(&lookup, "APP_ENV", Environment::Production)?;

    let database = DatabaseConfig {
      url: lookup("DATABASE_URL")
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?,
      max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 20u32)?,
      acquire_timeout: Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5u64)?),
      run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", false)?,
    };
    if database.max_connections == 0 {
      return Err(AppError::Config("DB_MAX_CONNECTIONS must be at least 1".to_string()));
    }

    let request_timeout = Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?);

    let capacity = parse_or(&lookup, "ORDER_CACHE_CAPACITY", 10_000usize)?;
    let order_cache = OrderCacheConfig {
      ttl: Duration::from_secs(parse_or(&lookup, "ORDER_CACHE_TTL_SECS", 3600u64)?),
      capacity: NonZeroUsize::new(capacity)
        .ok_or_else(|| AppError::Config("ORDER_CACHE_CAPACITY must be at least 1".to_string()))?,
    };

    let shipping = shipping_from_source(&lookup)?;

    tracing::info!(
      host = %server_host,
      port = server_port,
      environment = ?environment,
      max_connections = database.max_connections,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      environment,
      database,
      request_timeout,
      order_cache,
      shipping,
    })
  }
}

fn shipping_from_source<F>(lookup: &F) -> Result<ShippingConfig>
where
  F: Fn(&str) -> Option<String>,
{
  let defaults = RateTable::default();
  let usps = parse_or(lookup, "SHIPPING_RATES_USPS", defaults.usps)?;
  let rates = RateTable {
    usps,
    ups: parse_or(lookup, "SHIPPING_RATES_UPS", defaults.ups)?,
    fedex: parse_or(lookup, "SHIPPING_RATES_FEDEX", defaults.fedex)?,
    // Unconfigured carriers follow whatever USPS is set to.
    other: parse_or(lookup, "SHIPPING_RATES_OTHER", usps)?,
  };

  let fallback = match lookup("SHIPPING_FALLBACK_FEE") {
    None => FallbackFee::CarrierRate,
    Some(raw) if raw.trim().eq_ignore_ascii_case("carrier") => FallbackFee::CarrierRate,
    Some(raw) => {
      let fee = Decimal::from_str(raw.trim())
        .map_err(|e| AppError::Config(format!("Invalid SHIPPING_FALLBACK_FEE '{}': {}", raw, e)))?;
      if fee.is_sign_negative() {
        return Err(AppError::Config("SHIPPING_FALLBACK_FEE must not be negative".to_string()));
      }
      FallbackFee::Flat(fee)
    }
  };

  Ok(ShippingConfig { rates, fallback })
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
  F: Fn(&str) -> Option<String>,
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match lookup(name) {
    None => Ok(default),
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e))),
  }
}
