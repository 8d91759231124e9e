use actix_web::{body, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use kopi_common::Secret;
use kopi_engine::db_types::{Order, OrderId, OrderStatusType, Role, Rupiah};
use log::debug;
use midtrans_tools::MidtransConfig;

use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    server::{json_config, path_config, query_config},
};

pub const MIDTRANS_SERVER_KEY: &str = "SB-Mid-server-TEST";

// A test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("e2f0c57c8b1d4a4f9e6a3b7d5c2e1f08-kopi-test")
}

pub fn get_midtrans_config() -> MidtransConfig {
    MidtransConfig { server_key: Secret::new(MIDTRANS_SERVER_KEY.to_string()), ..MidtransConfig::default() }
}

pub fn issue_token(user_id: i64, role: Role) -> String {
    TokenIssuer::new(&get_auth_config())
        .issue_token(user_id, "Siti", "siti@example.com", role, None)
        .expect("Failed to sign token")
}

pub fn bearer(user_id: i64, role: Role) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", issue_token(user_id, role)))
}

/// Sends `req` to an app configured like the real server, and returns the status and body. Errors raised by
/// middleware are rendered the same way the HTTP layer would render them.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .app_data(web::Data::new(get_auth_config()))
        .app_data(web::Data::new(get_midtrans_config()))
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1,
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let bytes = body::to_bytes(res.into_body()).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

pub fn order(id: i64, order_id: &str, user_id: i64, status: OrderStatusType) -> Order {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    Order {
        id,
        order_id: OrderId(order_id.to_string()),
        user_id,
        total_amount: Rupiah::from(52_000),
        shipping_fee: Rupiah::from(0),
        shipping_address: "Jl. Braga No. 12, Bandung".to_string(),
        payment_method: "midtrans".to_string(),
        notes: None,
        status,
        created_at,
        updated_at: created_at,
    }
}
