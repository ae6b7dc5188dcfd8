// marketplace/tests/http_api_tests.rs
mod common;

use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::*;
use marketplace::web::configure_app_routes;
use serde_json::{json, Value};

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

async fn json_body(resp: ServiceResponse) -> Value {
  test::read_body_json(resp).await
}

fn cart_of_two() -> Value {
  json!({
    "items": [{ "id": 1, "price": "10.00", "quantity": 2 }],
    "taxRate": "0.0725",
    "subtotal": "20.00",
    "tax": "1.45",
    "total": "21.45"
  })
}

#[actix_web::test]
async fn placing_an_order_requires_a_caller() {
  let ctx = test_app();
  let app = init_app!(ctx.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .set_json(cart_of_two())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(json_body(resp).await["message"], "Authentication required.");
  assert_eq!(ctx.store.order_count(), 0);
}

#[actix_web::test]
async fn placed_order_can_be_read_back_by_its_buyer_only() {
  let ctx = test_app();
  let app = init_app!(ctx.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(("X-User-ID", "42"))
    .set_json(cart_of_two())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = json_body(resp).await;
  assert_eq!(body["message"], "Order created successfully");
  let order_id = body["orderId"].as_i64().unwrap();
  assert_eq!(body["orderIds"], json!([order_id]));

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}", order_id))
    .insert_header(("X-User-ID", "42"))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let detail = json_body(resp).await;
  assert_eq!(detail["id"], order_id);
  assert_eq!(detail["subtotal"], "20.00");
  assert_eq!(detail["taxAmount"], "1.45");
  assert_eq!(detail["priceAtPurchase"], "21.45");
  assert_eq!(detail["listingTitle"], "Vintage camera strap");
  assert_eq!(detail["items"][0]["quantity"], 2);

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}", order_id))
    .insert_header(("X-User-ID", "43"))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn invalid_orders_get_a_400_with_every_violation() {
  let ctx = test_app();
  let app = init_app!(ctx.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(("X-User-ID", "42"))
    .set_json(json!({ "items": [] }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_body(resp).await;
  assert_eq!(body["message"], "Invalid order request");
  assert_eq!(body["errors"], json!(["Order must contain at least one item"]));

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(("X-User-ID", "42"))
    .set_json(json!({ "items": [{ "price": "1.00" }, { "id": 2, "price": "1.005", "quantity": 1 }] }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_body(resp).await;
  assert_eq!(
    body["errors"],
    json!([
      "Item 0: id is required",
      "Item 0: quantity is required",
      "Item 1: price must have at most 2 decimal places"
    ])
  );

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(("X-User-ID", "42"))
    .insert_header(("Content-Type", "application/json"))
    .set_payload("{\"items\": [")
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(resp).await["message"], "Malformed JSON body");

  assert_eq!(ctx.store.order_count(), 0);
}

#[actix_web::test]
async fn oversized_amounts_are_rejected_with_a_400() {
  let ctx = test_app();
  let app = init_app!(ctx.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(("X-User-ID", "42"))
    .set_json(json!({
      "items": [{ "id": 1, "price": "79228162514264337593543950.33", "quantity": 1000 }],
      "taxRate": "0.05"
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(
    json_body(resp).await["errors"],
    json!(["Item 0: price must not exceed 9999999999.99"])
  );

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(("X-User-ID", "42"))
    .set_json(json!({
      "items": [{ "id": 1, "price": "9999999999.99", "quantity": 2 }],
      "taxRate": "0.00005"
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(
    json_body(resp).await["errors"],
    json!(["taxRate must have at most 4 decimal places"])
  );
  assert_eq!(ctx.store.order_count(), 0);

  let req = test::TestRequest::post()
    .uri("/api/v1/shipping/calculate")
    .set_json(json!({
      "items": [{ "sellerId": SELLER_WITHOUT_POLICY, "weightOunces": "79228162514264337593543950335", "quantity": 2 }],
      "shipping_method_id": USPS_GROUND
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(
    json_body(resp).await["errors"],
    json!(["Item 0: weightOunces must not exceed 40000"])
  );
}

#[actix_web::test]
async fn slow_checkout_answers_504_and_writes_nothing() {
  tokio::time::pause();
  let ctx = slow_checkout_app(std::time::Duration::from_secs(60), 1);
  let app = init_app!(ctx.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(("X-User-ID", "42"))
    .set_json(cart_of_two())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
  let body = json_body(resp).await;
  assert_eq!(body["message"], "The request took too long to complete.");
  assert_eq!(body["retryable"], true);
  assert_eq!(ctx.store.order_count(), 0);
}

#[actix_web::test]
async fn non_numeric_and_unknown_order_ids() {
  let ctx = test_app();
  let app = init_app!(ctx.state);

  let req = test::TestRequest::get()
    .uri("/api/v1/orders/abc")
    .insert_header(("X-User-ID", "42"))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::get()
    .uri("/api/v1/orders/31337")
    .insert_header(("X-User-ID", "42"))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(json_body(resp).await["message"], "Order 31337 not found");
}

#[actix_web::test]
async fn my_orders_returns_a_page_and_rejects_unknown_statuses() {
  let ctx = test_app();
  let app = init_app!(ctx.state);

  for _ in 0..3 {
    let req = test::TestRequest::post()
      .uri("/api/v1/orders")
      .insert_header(("X-User-ID", "42"))
      .set_json(cart_of_two())
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
  }

  let req = test::TestRequest::get()
    .uri("/api/v1/orders/my-orders?page=2&limit=2")
    .insert_header(("X-User-ID", "42"))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["orders"].as_array().unwrap().len(), 1);
  assert_eq!(
    body["pagination"],
    json!({ "currentPage": 2, "totalPages": 2, "totalItems": 3, "itemsPerPage": 2 })
  );

  let req = test::TestRequest::get()
    .uri("/api/v1/orders/my-orders?status=lost")
    .insert_header(("X-User-ID", "42"))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn shipping_quote_and_catalog() {
  let ctx = test_app();
  let app = init_app!(ctx.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/shipping/calculate")
    .set_json(json!({
      "items": [{ "sellerId": SELLER_WITHOUT_POLICY, "weightOunces": 20, "quantity": 1 }],
      "shipping_method_id": USPS_GROUND
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["cost"], "5.50");
  assert_eq!(body["provider"], "USPS");
  assert_eq!(body["breakdown"][0]["charge_basis"], "fallback");

  let req = test::TestRequest::post()
    .uri("/api/v1/shipping/calculate")
    .set_json(json!({ "shipping_method_id": USPS_GROUND }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(resp).await["errors"], json!(["items must be an array"]));

  let req = test::TestRequest::get().uri("/api/v1/shipping/methods").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let methods = json_body(resp).await;
  let ids: Vec<i64> = methods
    .as_array()
    .unwrap()
    .iter()
    .map(|m| m["id"].as_i64().unwrap())
    .collect();
  assert_eq!(ids, vec![USPS_GROUND, UPS_GROUND, FEDEX_2DAY]);
}

#[actix_web::test]
async fn sellers_manage_their_own_shipping_policy() {
  let ctx = test_app();
  let app = init_app!(ctx.state);
  let uri = format!("/api/v1/shipping/policy/{}", SELLER_WITHOUT_POLICY);

  let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let update = json!({ "offersFreeShipping": false, "standardShippingFee": "3.25", "policyText": "Ships Mondays." });

  let req = test::TestRequest::put()
    .uri(&uri)
    .insert_header(("X-User-ID", SELLER_FLAT_FIVE.to_string()))
    .set_json(update.clone())
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::put()
    .uri(&uri)
    .insert_header(("X-User-ID", SELLER_WITHOUT_POLICY.to_string()))
    .set_json(json!({ "standardShippingFee": "-1" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::put()
    .uri(&uri)
    .insert_header(("X-User-ID", SELLER_WITHOUT_POLICY.to_string()))
    .set_json(update)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["standard_shipping_fee"], "3.25");

  let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["policy_text"], "Ships Mondays.");

  // The new flat fee now prices this seller's quotes.
  let req = test::TestRequest::post()
    .uri("/api/v1/shipping/calculate")
    .set_json(json!({
      "items": [{ "sellerId": SELLER_WITHOUT_POLICY, "weightOunces": 20 }],
      "shipping_method_id": USPS_GROUND
    }))
    .to_request();
  let body = json_body(test::call_service(&app, req).await).await;
  assert_eq!(body["cost"], "3.25");
}

#[actix_web::test]
async fn health_reflects_store_reachability() {
  let ctx = test_app();
  let app = init_app!(ctx.state);

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);

  ctx.store.set_unavailable(true);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
