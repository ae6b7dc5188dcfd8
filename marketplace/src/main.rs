// marketplace/src/main.rs

use marketplace::config::AppConfig;
use marketplace::models::OrderDetail;
use marketplace::services::{CacheStore, MemoryCache};
use marketplace::state::AppState;
use marketplace::store::{MarketStore, PgStore};
use marketplace::web::configure_app_routes;
use marketplace::web::middleware::expose_error_detail;

use actix_web::middleware::{from_fn, Condition};
use actix_web::{web as actix_data, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let json_logs = std::env::var("LOG_FORMAT")
    .map(|v| v.eq_ignore_ascii_case("json"))
    .unwrap_or(false);

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  if json_logs {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  init_tracing();
  tracing::info!("Starting marketplace server...");

  let app_config = AppConfig::from_env().map_err(|e| {
    tracing::error!(error = %e, "Failed to load application configuration.");
    io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
  })?;
  let expose_detail = app_config.environment.is_development();

  let db_pool = PgPoolOptions::new()
    .max_connections(app_config.database.max_connections)
    .acquire_timeout(app_config.database.acquire_timeout)
    .connect(&app_config.database.url)
    .await
    .map_err(|e| {
      tracing::error!(error = %e, "Failed to connect to the database.");
      io::Error::new(io::ErrorKind::ConnectionRefused, e.to_string())
    })?;
  tracing::info!("Successfully connected to the database.");

  if app_config.database.run_migrations {
    sqlx::migrate!("./migrations").run(&db_pool).await.map_err(|e| {
      tracing::error!(error = %e, "Database migrations failed.");
      io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;
    tracing::info!("Database migrations applied.");
  }

  let store: Arc<dyn MarketStore> = Arc::new(PgStore::new(db_pool));
  let cache: Arc<dyn CacheStore<OrderDetail>> = Arc::new(MemoryCache::new(app_config.order_cache.capacity));

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let app_state = AppState::new(store, cache, app_config);

  tracing::info!("Attempting to bind server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(Condition::new(expose_detail, from_fn(expose_error_detail)))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
