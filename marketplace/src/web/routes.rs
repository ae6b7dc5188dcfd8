// marketplace/src/web/routes.rs

use actix_web::{error, web, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::state::AppState;
use crate::store::StoreHealth;
use crate::web::handlers::{order_handlers, policy_handlers, shipping_handlers};

// Reports 503 when the store cannot be reached.
async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  match app_state.store.ping().await {
    Ok(()) => HttpResponse::Ok().json(json!({ "status": "ok" })),
    Err(e) => {
      tracing::warn!(error = %e, "Health check could not reach the store.");
      HttpResponse::ServiceUnavailable().json(json!({ "status": "unavailable" }))
    }
  }
}

/// Extractor failures (bad JSON, non-numeric ids, bad query strings) answer
/// with the same 400 body as every other validation error.
pub fn extractor_error_handlers(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
      let detail = err.to_string();
      error::Error::from(AppError::validation("Malformed JSON body", vec![detail]))
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
      let detail = err.to_string();
      error::Error::from(AppError::validation("Invalid path parameter", vec![detail]))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
      let detail = err.to_string();
      error::Error::from(AppError::validation("Invalid query string", vec![detail]))
    }));
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  extractor_error_handlers(cfg);
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::place_order_handler))
          // Registered before "/{order_id}" so it is not read as an id.
          .route("/my-orders", web::get().to(order_handlers::list_my_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
      )
      .service(
        web::scope("/shipping")
          .route("/calculate", web::post().to(shipping_handlers::calculate_shipping_handler))
          .route("/methods", web::get().to(shipping_handlers::list_shipping_methods_handler))
          .route(
            "/policy/{seller_id}",
            web::get().to(policy_handlers::get_seller_policy_handler),
          )
          .route(
            "/policy/{seller_id}",
            web::put().to(policy_handlers::update_seller_policy_handler),
          ),
      ),
  );
}
