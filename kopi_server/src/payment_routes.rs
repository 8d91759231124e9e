//! Route handlers for the Midtrans Snap integration.
//!
//! * `/payment/midtrans/token` issues a Snap token for the hosted checkout widget.
//! * `/payment/notification` receives Midtrans HTTP notifications. It is not authenticated with a bearer token.
//!   Instead, every notification must carry a valid `signature_key`, which is checked before anything else happens.
//!   The signature does not cover the transaction status, so the status and amount that are acted on come from a
//!   Core API lookup. The endpoint can additionally be restricted to an IP whitelist (see
//!   [`crate::config::MidtransConfig`]).

use actix_web::{web, HttpResponse};
use chrono::Utc;
use kopi_engine::{
    db_types::{OrderId, OrderStatusType, Rupiah},
    OrderBackend,
    OrderFlowApi,
    StatusUpdate,
};
use log::*;
use midtrans_tools::{
    fallback_order_ref,
    verify_notification,
    MidtransConfig as MidtransApiConfig,
    SnapGateway,
    SnapTransactionRequest,
    TransactionNotification,
};

use crate::{
    auth::JwtClaims,
    data_objects::{DataResponse, JsonResponse, PaymentTokenRequest, PaymentTokenResponse},
    errors::ServerError,
    integrations::midtrans::{check_status_code, confirmed_payment, order_status_for, snap_request_for_order},
    route,
};

route!(payment_token => Post "/midtrans/token" impl OrderBackend, SnapGateway);
/// Requests a Snap token.
///
/// If the request names an order, it must be one of the caller's own pending orders and the amount charged is the
/// order total plus shipping. Otherwise the caller supplies the amount and (optionally) the line items, and a fresh
/// order reference is generated.
pub async fn payment_token<B, G>(
    claims: JwtClaims,
    body: web::Json<PaymentTokenRequest>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderBackend,
    G: SnapGateway,
{
    let req = body.into_inner();
    let snap_request = match req.order_id.filter(|s| !s.trim().is_empty()) {
        Some(order_id) => {
            let order_id = OrderId::from(order_id);
            debug!("💳️ POST payment token for order {order_id} by user {}", claims.id);
            let order = api.fetch_order(&claims.requester(), &order_id).await?;
            if order.order.status != OrderStatusType::Pending {
                return Err(ServerError::IllegalTransition(format!(
                    "Order {order_id} is {} and cannot be paid for",
                    order.order.status
                )));
            }
            snap_request_for_order(&order, &claims)
        },
        None => {
            let amount = req
                .amount
                .ok_or_else(|| ServerError::InvalidRequest("Invalid amount".into()))
                .and_then(|a| Rupiah::round_from(a).map_err(|e| ServerError::InvalidRequest(e.to_string())))?;
            if !amount.is_positive() {
                return Err(ServerError::InvalidRequest("Invalid amount".into()));
            }
            let order_ref = fallback_order_ref(&claims.id.to_string(), Utc::now());
            debug!("💳️ POST payment token for {amount} ({order_ref}) by user {}", claims.id);
            SnapTransactionRequest::new(order_ref, amount.value())
                .with_customer(claims.name.as_str(), claims.email.as_str())
                .with_items(req.items.unwrap_or_default())
        },
    };
    let order_ref = snap_request.order_id().to_string();
    let token = gateway.create_transaction(snap_request).await.map_err(|e| {
        warn!("💳️ Could not get a Snap token for {order_ref}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(DataResponse::new(PaymentTokenResponse::new(order_ref, token))))
}

route!(payment_notification => Post "" impl OrderBackend, SnapGateway);
/// Handles a Midtrans HTTP notification.
///
/// Responses:
/// * 403 if the signature does not verify. Nothing is looked up or changed.
/// * 400 if the notification claims a payment its status code does not back up, or if Midtrans reports a payment
///   for a different amount than the order is due.
/// * 502 if Midtrans cannot confirm the transaction. Midtrans retries the notification later.
/// * 404 if the order does not exist.
/// * 200 otherwise, including for duplicate and out-of-order notifications, which are acknowledged without any
///   effect so that Midtrans stops retrying them.
pub async fn payment_notification<B, G>(
    body: web::Json<TransactionNotification>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<G>,
    config: web::Data<MidtransApiConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderBackend,
    G: SnapGateway,
{
    let notification = body.into_inner();
    trace!("💳️ Received payment notification for {}", notification.order_id);
    verify_notification(&notification, config.server_key.reveal())?;
    check_status_code(&notification.status_code, order_status_for(&notification))?;
    let confirmed = gateway.transaction_status(&notification.order_id).await.map_err(|e| {
        warn!("💳️ Could not confirm the transaction for {}. {e}", notification.order_id);
        ServerError::from(e)
    })?;
    let (status, charged) = confirmed_payment(&notification, &confirmed)?;
    info!(
        "💳️ Verified notification for {}. Transaction: {}. Fraud: {}. Charged: {charged}. Maps to {status}",
        notification.order_id,
        confirmed.transaction_status,
        confirmed.fraud_status.as_deref().unwrap_or("none")
    );
    let order_id = OrderId::from(notification.order_id);
    let update = api.apply_gateway_payment(&order_id, status, charged).await?;
    let message = match &update {
        StatusUpdate::Changed { from, order } => format!("Order {order_id} moved from {from} to {}", order.status),
        StatusUpdate::Unchanged { order } => format!("Order {order_id} is already {}", order.status),
        StatusUpdate::Ignored { order } => {
            format!("Notification ignored. Order {order_id} is {} and cannot move to {status}", order.status)
        },
    };
    debug!("💳️ {message}");
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}
