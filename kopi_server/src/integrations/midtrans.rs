use kopi_engine::db_types::{OrderStatusType, OrderWithItems, Rupiah};
use midtrans_tools::{
    FraudStatus,
    ItemDetail,
    SnapTransactionRequest,
    TransactionNotification,
    TransactionStatus,
    TransactionStatusResponse,
};

use crate::{auth::JwtClaims, errors::ServerError};

/// Midtrans reports successful captures and settlements with this status code.
const PAYMENT_STATUS_CODE: &str = "200";

/// Maps a (verified) Midtrans notification onto the order status it implies.
///
/// Anything the mapping does not recognise, including refunds and captures with an unknown fraud verdict, maps to
/// `pending`. That is never a legal move away from a paid order, so such notifications end up acknowledged and
/// ignored.
pub fn order_status_for(notification: &TransactionNotification) -> OrderStatusType {
    map_status(&notification.status(), notification.fraud().as_ref())
}

pub fn map_status(status: &TransactionStatus, fraud: Option<&FraudStatus>) -> OrderStatusType {
    match (status, fraud) {
        (TransactionStatus::Capture, Some(FraudStatus::Accept)) => OrderStatusType::Paid,
        (TransactionStatus::Capture, _) => OrderStatusType::Pending,
        (TransactionStatus::Settlement, _) => OrderStatusType::Paid,
        (TransactionStatus::Cancel | TransactionStatus::Deny | TransactionStatus::Expire, _) => OrderStatusType::Failed,
        (TransactionStatus::Pending, _) => OrderStatusType::Pending,
        (TransactionStatus::Refund | TransactionStatus::Other(_), _) => OrderStatusType::Pending,
    }
}

/// The signature covers `status_code` but not `transaction_status`, so a notification is only believed to report a
/// payment if both agree.
pub fn check_status_code(status_code: &str, mapped: OrderStatusType) -> Result<(), ServerError> {
    if mapped == OrderStatusType::Paid && status_code != PAYMENT_STATUS_CODE {
        return Err(ServerError::InvalidRequest(format!("Status code {status_code} does not report a payment")));
    }
    Ok(())
}

/// Reconciles a verified notification with the transaction as Midtrans itself reports it. Returns the order status to
/// apply and the amount that was charged, both taken from the status lookup.
pub fn confirmed_payment(
    notification: &TransactionNotification,
    confirmed: &TransactionStatusResponse,
) -> Result<(OrderStatusType, Rupiah), ServerError> {
    if confirmed.order_id != notification.order_id {
        return Err(ServerError::InvalidRequest(format!(
            "Midtrans reported transaction {} when asked about {}",
            confirmed.order_id, notification.order_id
        )));
    }
    let status = map_status(&confirmed.status(), confirmed.fraud().as_ref());
    check_status_code(&confirmed.status_code, status)?;
    let charged = confirmed
        .gross_amount
        .parse::<Rupiah>()
        .map_err(|e| ServerError::InvalidRequest(format!("Invalid gross amount. {e}")))?;
    Ok((status, charged))
}

/// Builds the Snap request for a stored order. The gateway charges the order total plus shipping, and the line items
/// include shipping as a separate line so that they add up to the gross amount.
pub fn snap_request_for_order(order: &OrderWithItems, claims: &JwtClaims) -> SnapTransactionRequest {
    let mut items = order
        .items
        .iter()
        .map(|item| ItemDetail {
            id: item.product_id.to_string(),
            name: item.product_name.clone(),
            price: item.price.value(),
            quantity: item.quantity,
        })
        .collect::<Vec<_>>();
    let shipping = order.order.shipping_fee;
    if shipping.is_positive() {
        items.push(ItemDetail { id: "shipping".into(), name: "Shipping".into(), price: shipping.value(), quantity: 1 });
    }
    SnapTransactionRequest::new(order.order.order_id.as_str(), order.order.amount_due().value())
        .with_customer(claims.name.as_str(), claims.email.as_str())
        .with_items(items)
}
