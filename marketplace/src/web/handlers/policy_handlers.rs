// marketplace/src/web/handlers/policy_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::SellerPolicyUpdate;
use crate::state::AppState;
use crate::store::SellerPolicies;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::get_seller_policy", skip(app_state))]
pub async fn get_seller_policy_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let seller_id = path.into_inner();
  let policy = app_state
    .store
    .seller_policy(seller_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("No shipping policy for seller {}", seller_id)))?;
  Ok(HttpResponse::Ok().json(policy))
}

#[instrument(
    name = "handler::update_seller_policy",
    skip(app_state, auth_user, req_payload),
    fields(caller = auth_user.user_id)
)]
pub async fn update_seller_policy_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<i64>,
  req_payload: web::Json<SellerPolicyUpdate>,
) -> Result<HttpResponse, AppError> {
  let seller_id = path.into_inner();
  if !auth_user.can_access(seller_id) {
    warn!(seller_id, "Caller may not edit this seller's shipping policy.");
    return Err(AppError::Forbidden(
      "Only the seller or an admin can change this shipping policy.".to_string(),
    ));
  }

  let update = req_payload.into_inner();
  update
    .validate()
    .map_err(|errors| AppError::validation("Invalid shipping policy", errors))?;

  let saved = app_state.store.upsert_seller_policy(&update.into_policy(seller_id)).await?;
  info!(seller_id, "Seller shipping policy saved.");
  Ok(HttpResponse::Ok().json(saved))
}
