mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::Duration;
use common::{TestApp, JWT_SECRET};
use pasar_api::services::auth_service::issue_token;
use pasar_api::web::{configure_app_routes, json_config, query_config};
use serde_json::{json, Value};
use serial_test::serial;

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state))
        .app_data(json_config())
        .app_data(query_config())
        .configure(configure_app_routes),
    )
    .await
  };
}

fn bearer(user_id: i64) -> (&'static str, String) {
  let token = issue_token(JWT_SECRET, user_id, Duration::hours(1)).unwrap();
  ("Authorization", format!("Bearer {}", token))
}

#[actix_web::test]
#[serial]
async fn health_check_answers_ok() {
  let app = TestApp::new();
  let service = init_app!(app.state.clone());

  let resp = test::call_service(&service, test::TestRequest::get().uri("/api/v1/health").to_request()).await;

  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
#[serial]
async fn order_lifecycle_over_http() {
  let app = TestApp::new();
  let service = init_app!(app.state.clone());

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(bearer(app.buyer.id))
    .set_json(json!({ "productId": app.product.id, "quantity": 2 }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], 201);
  assert_eq!(body["message"], "Order created successfully");
  assert_eq!(body["data"]["order"]["status"], "PENDING");
  assert_eq!(body["data"]["order"]["totalAmount"], 200_000);
  let order_id = body["data"]["order"]["id"].as_i64().unwrap();
  let reference = body["data"]["order"]["orderReference"].as_str().unwrap().to_string();

  let req = test::TestRequest::post()
    .uri("/api/v1/orders/notification")
    .set_json(json!({ "order_id": reference, "transaction_status": "settlement" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&service, req).await;
  assert_eq!(body["message"], "Payment notification handled successfully");
  assert_eq!(body["data"]["order"]["status"], "PAID");

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/reviews", order_id))
    .insert_header(bearer(app.buyer.id))
    .set_json(json!({ "rating": 5, "comment": "Kopinya enak" }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let req = test::TestRequest::get()
    .uri("/api/v1/orders/history?page=1&pageSize=5")
    .insert_header(bearer(app.buyer.id))
    .to_request();
  let body: Value = test::call_and_read_body_json(&service, req).await;
  assert_eq!(body["message"], "Transaction history retrieved successfully");
  assert_eq!(body["data"]["orders"][0]["storeName"], "toko-kopi");
  assert!(body["data"]["orders"][0]["reviewId"].is_i64());
  assert_eq!(body["data"]["pagination"]["pageSize"], 5);
  assert_eq!(body["data"]["pagination"]["totalPages"], 1);
}

#[actix_web::test]
#[serial]
async fn cancel_over_http_returns_the_cancelled_order() {
  let app = TestApp::new();
  let order = app.place_order(2).await;
  let service = init_app!(app.state.clone());

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/cancel", order.id))
    .insert_header(bearer(app.buyer.id))
    .to_request();
  let body: Value = test::call_and_read_body_json(&service, req).await;

  assert_eq!(body["message"], "Order cancelled successfully");
  assert_eq!(body["data"]["order"]["status"], "CANCELED");
  assert_eq!(app.stock(), 5);
}

#[actix_web::test]
#[serial]
async fn requests_without_a_valid_token_are_unauthorized() {
  let app = TestApp::new();
  let service = init_app!(app.state.clone());

  let req = test::TestRequest::get().uri("/api/v1/orders/history").to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Unauthorized access.");

  let req = test::TestRequest::get()
    .uri("/api/v1/orders/history")
    .insert_header(("Authorization", "Bearer not-a-jwt"))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[serial]
async fn bad_input_uses_the_error_envelope() {
  let app = TestApp::new();
  let service = init_app!(app.state.clone());

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(bearer(app.buyer.id))
    .set_json(json!({ "productId": app.product.id }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "The given data was invalid.");
  assert_eq!(body["errors"]["quantity"][0], "The quantity field is required");

  let req = test::TestRequest::post()
    .uri("/api/v1/orders/abc/cancel")
    .insert_header(bearer(app.buyer.id))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(bearer(app.buyer.id))
    .insert_header(("Content-Type", "application/json"))
    .set_payload("{not json")
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["errors"]["body"].is_array());
}

#[actix_web::test]
#[serial]
async fn history_accepts_the_largest_page_size() {
  let app = TestApp::new();
  app.place_order(1).await;
  app.place_order(1).await;
  let service = init_app!(app.state.clone());

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/history?pageSize={}", i64::MAX))
    .insert_header(bearer(app.buyer.id))
    .to_request();
  let resp = test::call_service(&service, req).await;

  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["pagination"]["totalPages"], 1);
  assert_eq!(body["data"]["orders"].as_array().map(Vec::len), Some(2));
}
