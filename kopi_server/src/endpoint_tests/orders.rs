use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use kopi_engine::{
    db_types::{OrderId, OrderStatusType, Role},
    events::EventProducers,
    OrderFlowError,
    OrderFlowApi,
};
use mockall::predicate::{always, eq};
use serde_json::{json, Value};

use super::{
    helpers::{bearer, order, send_request},
    mocks::MockOrderStore,
};
use crate::routes::{
    AllOrdersRoute,
    CancelOrderRoute,
    CreateOrderRoute,
    DeleteOrderRoute,
    MyOrdersRoute,
    OrderByIdRoute,
    SellerOrdersRoute,
    UpdateOrderStatusRoute,
};

const ORDER_REF: &str = "KOPI-20240301-0000A1B2";

fn configure(store: MockOrderStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(store, EventProducers::default());
        cfg.app_data(web::Data::new(api))
            .service(CreateOrderRoute::<MockOrderStore>::new())
            .service(MyOrdersRoute::<MockOrderStore>::new())
            .service(SellerOrdersRoute::<MockOrderStore>::new())
            .service(AllOrdersRoute::<MockOrderStore>::new())
            .service(UpdateOrderStatusRoute::<MockOrderStore>::new())
            .service(CancelOrderRoute::<MockOrderStore>::new())
            .service(OrderByIdRoute::<MockOrderStore>::new())
            .service(DeleteOrderRoute::<MockOrderStore>::new());
    }
}

fn order_id() -> OrderId {
    OrderId(ORDER_REF.to_string())
}

#[actix_web::test]
async fn checkout_empty_cart() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_checkout().times(1).returning(|_, _| Err(OrderFlowError::EmptyCart));
    let req = TestRequest::post()
        .uri("/order")
        .insert_header(bearer(5, Role::User))
        .set_json(json!({"shippingAddress": "Jl. Braga No. 12", "paymentMethod": "midtrans"}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "EMPTY_CART");
}

#[actix_web::test]
async fn checkout_without_address() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_checkout().never();
    let req = TestRequest::post()
        .uri("/order")
        .insert_header(bearer(5, Role::User))
        .set_json(json!({"shippingAddress": "  ", "paymentMethod": "midtrans"}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("BAD_REQUEST"));
}

#[actix_web::test]
async fn users_cannot_list_every_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_search_orders().never();
    let req = TestRequest::get().uri("/order/admin").insert_header(bearer(5, Role::User));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "FORBIDDEN");
}

#[actix_web::test]
async fn sellers_cannot_change_status() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_update_order_status().never();
    let req = TestRequest::put()
        .uri(&format!("/order/{ORDER_REF}/status"))
        .insert_header(bearer(3, Role::Seller))
        .set_json(json!({"status": "shipped"}));
    let (status, _) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn user_without_store_asks_for_seller_orders() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_seller_for_user().with(eq(1)).times(1).returning(|_| Ok(None));
    let req = TestRequest::get().uri("/order/seller").insert_header(bearer(1, Role::Admin));
    let (status, _) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn list_my_orders_with_bad_status_filter() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_search_orders().never();
    let req = TestRequest::get().uri("/order/user?status=lost").insert_header(bearer(5, Role::User));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("INVALID_STATUS"));
}

#[actix_web::test]
async fn list_my_orders() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_search_orders()
        .withf(|q| q.user_id == Some(5) && q.status == Some(OrderStatusType::Pending))
        .times(1)
        .returning(|_| Ok((vec![order(1, ORDER_REF, 5, OrderStatusType::Pending)], 1)));
    store.expect_fetch_order_items().with(eq(1)).returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri("/order/user?status=pending&page=1&limit=10").insert_header(bearer(5, Role::User));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["orders"][0]["order_id"], ORDER_REF);
    assert_eq!(body["data"]["pagination"]["total"], 1);
}

#[actix_web::test]
async fn fetch_another_users_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_order_id()
        .with(eq(order_id()))
        .returning(|_| Ok(Some(order(1, ORDER_REF, 99, OrderStatusType::Paid))));
    store.expect_fetch_order_items().never();
    let req = TestRequest::get().uri(&format!("/order/{ORDER_REF}")).insert_header(bearer(5, Role::User));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("NOT_FOUND"));
}

#[actix_web::test]
async fn admin_fetches_any_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_order_id()
        .with(eq(order_id()))
        .returning(|_| Ok(Some(order(1, ORDER_REF, 99, OrderStatusType::Paid))));
    store.expect_fetch_order_items().with(eq(1)).returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri(&format!("/order/{ORDER_REF}")).insert_header(bearer(1, Role::Admin));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["status"], "paid");
    assert_eq!(body["data"]["user_id"], 99);
}

#[actix_web::test]
async fn cancel_paid_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Paid))));
    store.expect_update_order_status().never();
    let req = TestRequest::put().uri(&format!("/order/{ORDER_REF}/cancel")).insert_header(bearer(5, Role::User));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("ILLEGAL_TRANSITION"));
}

#[actix_web::test]
async fn cancel_pending_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Pending))));
    store
        .expect_update_order_status()
        .with(eq(order_id()), eq(OrderStatusType::Pending), eq(OrderStatusType::Cancelled))
        .times(1)
        .returning(|_, _, _| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Cancelled))));
    store.expect_record_transaction().never();
    let req = TestRequest::put().uri(&format!("/order/{ORDER_REF}/cancel")).insert_header(bearer(5, Role::User));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["status"], "cancelled");
}

#[actix_web::test]
async fn admin_sets_unknown_status() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_update_order_status().never();
    let req = TestRequest::put()
        .uri(&format!("/order/{ORDER_REF}/status"))
        .insert_header(bearer(1, Role::Admin))
        .set_json(json!({"status": "teleported"}));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("INVALID_STATUS"));
}

#[actix_web::test]
async fn admin_marks_order_paid() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Pending))));
    store
        .expect_update_order_status()
        .with(always(), eq(OrderStatusType::Pending), eq(OrderStatusType::Paid))
        .times(1)
        .returning(|_, _, _| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Paid))));
    store
        .expect_record_transaction()
        .withf(|tx| tx.user_id == 5 && tx.reference.as_deref() == Some("order:KOPI-20240301-0000A1B2:paid"))
        .times(1)
        .returning(|_| Ok(None));
    let req = TestRequest::put()
        .uri(&format!("/order/{ORDER_REF}/status"))
        .insert_header(bearer(1, Role::Admin))
        .set_json(json!({"status": "paid"}));
    let (status, _) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn delete_open_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Processing))));
    store.expect_delete_order().never();
    let req = TestRequest::delete().uri(&format!("/order/{ORDER_REF}")).insert_header(bearer(1, Role::Admin));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("ILLEGAL_TRANSITION"));
}
