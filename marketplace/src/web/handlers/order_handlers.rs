// marketplace/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::run_workflow;
use crate::errors::AppError;
use crate::models::{OrderStatus, PlaceOrderRequest};
use crate::pipelines::contexts::{OrderLookupCtxData, PlaceOrderCtxData};
use crate::state::AppState;
use crate::store::{OrderQuery, Page};
use crate::web::extractors::AuthenticatedUser;
use orka::ContextData;

#[instrument(
    name = "handler::place_order",
    skip(app_state, auth_user, req_payload),
    fields(buyer_id = auth_user.user_id)
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let ctx_data = ContextData::new(PlaceOrderCtxData::new(
    app_state.get_ref().clone(),
    auth_user.user_id,
    req_payload.into_inner(),
  ));

  run_workflow(&app_state, ctx_data.clone()).await?;

  let order_ids = ctx_data.read().order_ids.clone();
  let order_id = order_ids
    .first()
    .copied()
    .ok_or_else(|| AppError::Internal("Order batch completed without any order ids.".to_string()))?;
  info!(order_count = order_ids.len(), order_id, "Checkout completed.");

  Ok(HttpResponse::Created().json(json!({
    "message": "Order created successfully",
    "orderIds": order_ids,
    "orderId": order_id,
  })))
}

#[instrument(
    name = "handler::get_order",
    skip(app_state, auth_user),
    fields(viewer = auth_user.user_id)
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let ctx_data = ContextData::new(OrderLookupCtxData::new(app_state.get_ref().clone(), order_id, auth_user));

  run_workflow(&app_state, ctx_data.clone()).await?;

  let detail = ctx_data
    .write()
    .order
    .take()
    .ok_or_else(|| AppError::Internal("Order lookup completed without an order.".to_string()))?;
  Ok(HttpResponse::Ok().json(detail))
}

#[derive(Deserialize, Debug)]
pub struct MyOrdersQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub status: Option<String>,
}

#[instrument(
    name = "handler::list_my_orders",
    skip(app_state, auth_user),
    fields(buyer_id = auth_user.user_id)
)]
pub async fn list_my_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query_params: web::Query<MyOrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let params = query_params.into_inner();
  let status = params
    .status
    .as_deref()
    .filter(|s| !s.trim().is_empty())
    .map(str::parse::<OrderStatus>)
    .transpose()
    .map_err(AppError::invalid)?;

  let query = OrderQuery::new()
    .with_buyer(auth_user.user_id)
    .with_status(status)
    .with_page(Page::new(params.page, params.limit));

  let result = app_state.orders.list_orders(&query).await?;
  Ok(HttpResponse::Ok().json(json!({
    "orders": result.items,
    "pagination": result.pagination(),
  })))
}
