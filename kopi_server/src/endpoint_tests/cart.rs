use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use kopi_engine::{
    db_types::{CartItem, CartUpdate, Role, Rupiah},
    CartApi,
};
use mockall::predicate::eq;
use serde_json::{json, Value};

use super::{
    helpers::{bearer, send_request},
    mocks::MockCartStore,
};
use crate::routes::{
    AddToCartRoute,
    ClearCartRoute,
    DecreaseCartItemRoute,
    IncreaseCartItemRoute,
    MyCartRoute,
    RemoveCartItemRoute,
    UpdateCartItemRoute,
};

fn configure(store: MockCartStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(CartApi::new(store)))
            .service(MyCartRoute::<MockCartStore>::new())
            .service(AddToCartRoute::<MockCartStore>::new())
            .service(ClearCartRoute::<MockCartStore>::new())
            .service(IncreaseCartItemRoute::<MockCartStore>::new())
            .service(DecreaseCartItemRoute::<MockCartStore>::new())
            .service(UpdateCartItemRoute::<MockCartStore>::new())
            .service(RemoveCartItemRoute::<MockCartStore>::new());
    }
}

fn cart_item(id: i64, quantity: i64) -> CartItem {
    CartItem {
        id,
        user_id: 5,
        product_id: 11,
        quantity,
        product_name: "Kopi Gayo 250g".to_string(),
        price: Rupiah::from(18_000),
        seller_id: 2,
        category_name: Some("Arabica".to_string()),
        unit_name: Some("pack".to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
    }
}

#[actix_web::test]
async fn fetch_cart_without_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCartStore::new();
    store.expect_fetch_cart().never();
    let req = TestRequest::get().uri("/cart");
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_AUTHENTICATED");
}

#[actix_web::test]
async fn fetch_cart_with_bad_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCartStore::new();
    store.expect_fetch_cart().never();
    let req = TestRequest::get().uri("/cart").insert_header(("Authorization", "Bearer not.a.token"));
    let (status, _) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_my_cart() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCartStore::new();
    store.expect_fetch_cart().with(eq(5)).times(1).returning(|_| Ok(vec![cart_item(1, 2)]));
    let req = TestRequest::get().uri("/cart").insert_header(bearer(5, Role::User));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["product_name"], "Kopi Gayo 250g");
    assert_eq!(body["data"][0]["quantity"], 2);
}

#[actix_web::test]
async fn add_to_cart_with_zero_quantity() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCartStore::new();
    store.expect_add_to_cart().never();
    let req = TestRequest::post()
        .uri("/cart")
        .insert_header(bearer(5, Role::User))
        .set_json(json!({"productId": 11, "quantity": 0}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("BAD_REQUEST"));
}

#[actix_web::test]
async fn add_to_cart() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCartStore::new();
    store.expect_add_to_cart().with(eq(5), eq(11), eq(3)).times(1).returning(|_, _, q| Ok(cart_item(1, q)));
    let req = TestRequest::post()
        .uri("/cart")
        .insert_header(bearer(5, Role::User))
        .set_json(json!({"product_id": 11, "quantity": 3}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["quantity"], 3);
}

#[actix_web::test]
async fn decrease_last_unit_removes_item() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCartStore::new();
    store
        .expect_adjust_cart_item_quantity()
        .with(eq(5), eq(1), eq(-1))
        .times(1)
        .returning(|_, _, _| Ok(Some(CartUpdate::Removed)));
    let req = TestRequest::put()
        .uri("/cart/decrease")
        .insert_header(bearer(5, Role::User))
        .set_json(json!({"itemId": 1}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["result"], "removed");
}

#[actix_web::test]
async fn increase_someone_elses_item() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCartStore::new();
    store.expect_adjust_cart_item_quantity().times(1).returning(|_, _, _| Ok(None));
    let req = TestRequest::put()
        .uri("/cart/increase")
        .insert_header(bearer(5, Role::User))
        .set_json(json!({"item_id": 42}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("NOT_FOUND"));
}

#[actix_web::test]
async fn set_quantity_to_zero_removes_item() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCartStore::new();
    store.expect_set_cart_item_quantity().never();
    store.expect_remove_cart_item().with(eq(5), eq(1)).times(1).returning(|_, _| Ok(true));
    let req =
        TestRequest::put().uri("/cart/1").insert_header(bearer(5, Role::User)).set_json(json!({"quantity": 0}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""result":"removed""#));
}

#[actix_web::test]
async fn clear_cart() {
    let _ = env_logger::try_init().ok();
    let mut store = MockCartStore::new();
    store.expect_clear_cart().with(eq(5)).times(1).returning(|_| Ok(3));
    let req = TestRequest::delete().uri("/cart").insert_header(bearer(5, Role::User));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Cart cleared"}"#);
}
