// marketplace/src/web/middleware.rs

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{Error, HttpResponse, ResponseError};

use crate::errors::AppError;

/// Re-renders 5xx `AppError` responses with the full error under `detail`.
///
/// Only mounted in development; `main` wraps it in `middleware::Condition`
/// keyed on the configured environment.
pub async fn expose_error_detail(
  req: ServiceRequest,
  next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
  let res = next.call(req).await?;

  let detailed = res
    .response()
    .error()
    .and_then(|err| err.as_error::<AppError>())
    .filter(|app_err| app_err.status_code().is_server_error())
    .map(|app_err| HttpResponse::build(app_err.status_code()).json(app_err.response_body(true)));

  Ok(match detailed {
    Some(response) => res.into_response(response).map_into_right_body(),
    None => res.map_into_left_body(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::http::StatusCode;
  use actix_web::middleware::{from_fn, Condition};
  use actix_web::{test, web, App};
  use serde_json::Value;

  async fn failing_save() -> Result<HttpResponse, AppError> {
    Err(AppError::Transaction("insert into order_items failed: fk violation".into()))
  }

  async fn missing_order() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound("Order 9 not found".into()))
  }

  async fn body_for(expose: bool, uri: &str) -> (StatusCode, Value) {
    let app = test::init_service(
      App::new()
        .wrap(Condition::new(expose, from_fn(expose_error_detail)))
        .route("/save", web::post().to(failing_save))
        .route("/order", web::get().to(missing_order)),
    )
    .await;
    let req = if uri == "/save" {
      test::TestRequest::post().uri(uri).to_request()
    } else {
      test::TestRequest::get().uri(uri).to_request()
    };
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    (status, test::read_body_json(resp).await)
  }

  #[actix_web::test]
  async fn development_responses_carry_the_error_detail() {
    let (status, body) = body_for(true, "/save").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "The order could not be saved. No changes were made.");
    assert!(body["detail"].as_str().unwrap().contains("fk violation"));
  }

  #[actix_web::test]
  async fn detail_stays_hidden_when_not_mounted() {
    let (status, body) = body_for(false, "/save").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("detail").is_none());
  }

  #[actix_web::test]
  async fn client_errors_pass_through_untouched() {
    let (status, body) = body_for(true, "/order").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({ "message": "Order 9 not found" }));
  }
}
