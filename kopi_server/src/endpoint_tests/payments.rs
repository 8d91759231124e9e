use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use kopi_engine::{
    db_types::{OrderStatusType, Role, Rupiah, TransactionStatus, TransactionType, WalletTransaction},
    events::EventProducers,
    OrderFlowApi,
};
use midtrans_tools::{
    notification_signature,
    MidtransApiError,
    SnapToken,
    TransactionNotification,
    TransactionStatusResponse,
};
use mockall::predicate::eq;
use serde_json::{json, Value};

use super::{
    helpers::{bearer, order, send_request, MIDTRANS_SERVER_KEY},
    mocks::{MockGateway, MockOrderStore},
};
use crate::payment_routes::{PaymentNotificationRoute, PaymentTokenRoute};

const ORDER_REF: &str = "KOPI-20240301-0000A1B2";

fn configure(store: MockOrderStore, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(store, EventProducers::default());
        cfg.app_data(web::Data::new(api)).app_data(web::Data::new(gateway)).service(
            web::scope("/payment")
                .service(PaymentTokenRoute::<MockOrderStore, MockGateway>::new())
                .service(
                    web::scope("/notification")
                        .service(PaymentNotificationRoute::<MockOrderStore, MockGateway>::new()),
                ),
        );
    }
}

/// Midtrans sends 200 for captures and settlements, 201 for pending or challenged transactions, and 202 or 407 for
/// failures.
fn status_code_for(transaction_status: &str, fraud_status: Option<&str>) -> &'static str {
    match (transaction_status, fraud_status) {
        ("capture", Some("challenge")) | ("pending", _) => "201",
        ("capture" | "settlement", _) => "200",
        ("expire", _) => "407",
        _ => "202",
    }
}

fn signed_notification(status_code: &str, gross_amount: &str, transaction_status: &str) -> TransactionNotification {
    TransactionNotification {
        order_id: ORDER_REF.to_string(),
        status_code: status_code.to_string(),
        gross_amount: gross_amount.to_string(),
        transaction_status: transaction_status.to_string(),
        fraud_status: None,
        signature_key: notification_signature(ORDER_REF, status_code, gross_amount, MIDTRANS_SERVER_KEY),
        transaction_id: Some("9aed5972-5b6a-401e-894b-a32c91ed1a3a".to_string()),
        payment_type: Some("bank_transfer".to_string()),
        transaction_time: Some("2024-03-01 10:15:00".to_string()),
    }
}

fn notification(transaction_status: &str, fraud_status: Option<&str>, key: &str) -> TransactionNotification {
    let status_code = status_code_for(transaction_status, fraud_status);
    let mut n = signed_notification(status_code, "52000.00", transaction_status);
    n.fraud_status = fraud_status.map(String::from);
    n.signature_key = notification_signature(ORDER_REF, status_code, "52000.00", key);
    n
}

fn status_lookup(transaction_status: &str, fraud_status: Option<&str>, gross_amount: &str) -> TransactionStatusResponse {
    TransactionStatusResponse {
        status_code: status_code_for(transaction_status, fraud_status).to_string(),
        status_message: Some("Success, transaction is found".to_string()),
        order_id: ORDER_REF.to_string(),
        gross_amount: gross_amount.to_string(),
        transaction_status: transaction_status.to_string(),
        fraud_status: fraud_status.map(String::from),
        transaction_id: Some("9aed5972-5b6a-401e-894b-a32c91ed1a3a".to_string()),
    }
}

/// A gateway that confirms the transaction exactly as described.
fn confirming_gateway(transaction_status: &'static str, fraud_status: Option<&'static str>) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway
        .expect_transaction_status()
        .withf(|order_id| order_id == ORDER_REF)
        .times(1)
        .returning(move |_| Ok(status_lookup(transaction_status, fraud_status, "52000.00")));
    gateway
}

fn ledger_entry() -> WalletTransaction {
    WalletTransaction {
        id: 17,
        user_id: 5,
        order_id: Some(1),
        amount: Rupiah::from(52_000),
        tx_type: TransactionType::Payment,
        status: TransactionStatus::Success,
        description: Some(format!("Payment for order #{ORDER_REF} (paid)")),
        reference: Some(format!("order:{ORDER_REF}:paid")),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 1).unwrap(),
    }
}

fn snap_token() -> SnapToken {
    SnapToken {
        token: "66e4fa55-fdac-4ef9-91b5-733b97d1b862".to_string(),
        redirect_url: "https://app.sandbox.midtrans.com/snap/v2/vtweb/66e4fa55-fdac-4ef9-91b5-733b97d1b862"
            .to_string(),
    }
}

#[actix_web::test]
async fn tampered_notification_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().never();
    store.expect_update_order_status().never();
    store.expect_record_transaction().never();
    let mut gateway = MockGateway::new();
    gateway.expect_transaction_status().never();
    let mut body = notification("settlement", None, MIDTRANS_SERVER_KEY);
    body.gross_amount = "1.00".to_string();
    let req = TestRequest::post().uri("/payment/notification").set_json(&body);
    let (status, body) = send_request(req, configure(store, gateway)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "INVALID_SIGNATURE");
}

#[actix_web::test]
async fn notification_signed_with_another_key_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().never();
    let mut gateway = MockGateway::new();
    gateway.expect_transaction_status().never();
    let body = notification("settlement", None, "SB-Mid-server-SOMEONE-ELSE");
    let req = TestRequest::post().uri("/payment/notification").set_json(&body);
    let (status, _) = send_request(req, configure(store, gateway)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn settlement_marks_order_paid() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Pending))));
    store
        .expect_update_order_status()
        .withf(|id, from, to| {
            id.as_str() == ORDER_REF && *from == OrderStatusType::Pending && *to == OrderStatusType::Paid
        })
        .times(1)
        .returning(|_, _, _| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Paid))));
    store
        .expect_record_transaction()
        .withf(|tx| tx.user_id == 5 && tx.amount == Rupiah::from(52_000) && tx.status == TransactionStatus::Success)
        .times(1)
        .returning(|_| Ok(Some(ledger_entry())));
    let body = notification("settlement", None, MIDTRANS_SERVER_KEY);
    let req = TestRequest::post().uri("/payment/notification").set_json(&body);
    let (status, body) = send_request(req, configure(store, confirming_gateway("settlement", None))).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], format!("Order {ORDER_REF} moved from pending to paid"));
}

#[actix_web::test]
async fn duplicate_settlement_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Paid))));
    store.expect_update_order_status().never();
    // The ledger entry already exists, so nothing new is written
    store.expect_record_transaction().times(1).returning(|_| Ok(None));
    let body = notification("settlement", None, MIDTRANS_SERVER_KEY);
    let req = TestRequest::post().uri("/payment/notification").set_json(&body);
    let (status, body) = send_request(req, configure(store, confirming_gateway("settlement", None))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("is already paid"));
}

#[actix_web::test]
async fn late_expiry_is_ignored() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Paid))));
    store.expect_update_order_status().never();
    store.expect_record_transaction().never();
    let body = notification("expire", None, MIDTRANS_SERVER_KEY);
    let req = TestRequest::post().uri("/payment/notification").set_json(&body);
    let (status, body) = send_request(req, configure(store, confirming_gateway("expire", None))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Notification ignored"));
}

#[actix_web::test]
async fn challenged_capture_stays_pending() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Pending))));
    store.expect_update_order_status().never();
    store.expect_record_transaction().never();
    let body = notification("capture", Some("challenge"), MIDTRANS_SERVER_KEY);
    let req = TestRequest::post().uri("/payment/notification").set_json(&body);
    let (status, body) = send_request(req, configure(store, confirming_gateway("capture", Some("challenge")))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("is already pending"));
}

#[actix_web::test]
async fn notification_for_unknown_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|_| Ok(None));
    let body = notification("settlement", None, MIDTRANS_SERVER_KEY);
    let req = TestRequest::post().uri("/payment/notification").set_json(&body);
    let (status, body) = send_request(req, configure(store, confirming_gateway("settlement", None))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("NOT_FOUND"));
}

#[actix_web::test]
async fn settlement_without_success_code_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().never();
    store.expect_update_order_status().never();
    let mut gateway = MockGateway::new();
    gateway.expect_transaction_status().never();
    // Correctly signed, but the signed status code says the transaction is still pending
    let body = signed_notification("201", "1.00", "settlement");
    let req = TestRequest::post().uri("/payment/notification").set_json(&body);
    let (status, body) = send_request(req, configure(store, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[actix_web::test]
async fn status_comes_from_the_gateway_not_the_notification() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Pending))));
    store.expect_update_order_status().never();
    store.expect_record_transaction().never();
    let body = notification("settlement", None, MIDTRANS_SERVER_KEY);
    let req = TestRequest::post().uri("/payment/notification").set_json(&body);
    let (status, body) = send_request(req, configure(store, confirming_gateway("pending", None))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("is already pending"));
}

#[actix_web::test]
async fn payment_for_the_wrong_amount_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Pending))));
    store.expect_update_order_status().never();
    store.expect_record_transaction().never();
    let mut gateway = MockGateway::new();
    gateway.expect_transaction_status().times(1).returning(|_| Ok(status_lookup("settlement", None, "1.00")));
    let body = signed_notification("200", "1.00", "settlement");
    let req = TestRequest::post().uri("/payment/notification").set_json(&body);
    let (status, body) = send_request(req, configure(store, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("is due Rp 52.000"), "{body}");
}

#[actix_web::test]
async fn unconfirmed_notification_is_retried_later() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_update_order_status().never();
    let mut gateway = MockGateway::new();
    gateway
        .expect_transaction_status()
        .times(1)
        .returning(|_| Err(MidtransApiError::RestResponseError("connection reset".to_string())));
    let body = notification("settlement", None, MIDTRANS_SERVER_KEY);
    let req = TestRequest::post().uri("/payment/notification").set_json(&body);
    let (status, body) = send_request(req, configure(store, gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("GATEWAY_ERROR"));
}

#[actix_web::test]
async fn token_for_free_amount() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_transaction()
        .withf(|req| req.gross_amount() == 25_000 && req.order_id().starts_with("ORDER-"))
        .times(1)
        .returning(|_| Ok(snap_token()));
    let req = TestRequest::post()
        .uri("/payment/midtrans/token")
        .insert_header(bearer(5, Role::User))
        .set_json(json!({"amount": 25000}));
    let (status, body) = send_request(req, configure(MockOrderStore::new(), gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["token"], "66e4fa55-fdac-4ef9-91b5-733b97d1b862");
}

#[actix_web::test]
async fn token_for_negative_amount() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().never();
    let req = TestRequest::post()
        .uri("/payment/midtrans/token")
        .insert_header(bearer(5, Role::User))
        .set_json(json!({"amount": -100}));
    let (status, body) = send_request(req, configure(MockOrderStore::new(), gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid amount"));
}

#[actix_web::test]
async fn token_requires_authentication() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().never();
    let req = TestRequest::post().uri("/payment/midtrans/token").set_json(json!({"amount": 25000}));
    let (status, _) = send_request(req, configure(MockOrderStore::new(), gateway)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn token_for_stored_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_order_id()
        .returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Pending))));
    store.expect_fetch_order_items().with(eq(1)).returning(|_| Ok(vec![]));
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_transaction()
        .withf(|req| req.order_id() == ORDER_REF && req.gross_amount() == 52_000)
        .times(1)
        .returning(|_| Ok(snap_token()));
    let req = TestRequest::post()
        .uri("/payment/midtrans/token")
        .insert_header(bearer(5, Role::User))
        .set_json(json!({"orderId": ORDER_REF, "amount": 1}));
    let (status, body) = send_request(req, configure(store, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["data"]["order_id"], ORDER_REF);
}

#[actix_web::test]
async fn token_for_paid_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_order_id().returning(|_| Ok(Some(order(1, ORDER_REF, 5, OrderStatusType::Paid))));
    store.expect_fetch_order_items().returning(|_| Ok(vec![]));
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().never();
    let req = TestRequest::post()
        .uri("/payment/midtrans/token")
        .insert_header(bearer(5, Role::User))
        .set_json(json!({"order_id": ORDER_REF}));
    let (status, body) = send_request(req, configure(store, gateway)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("ILLEGAL_TRANSITION"));
}
