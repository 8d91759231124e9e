use log::*;
use sha2::{Digest, Sha512};

use crate::{MidtransApiError, TransactionNotification};

/// `SHA512(order_id + status_code + gross_amount + server_key)`, hex encoded.
pub fn notification_signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks the `signature_key` of an HTTP notification. Nothing in the notification may be trusted until this
/// returns `Ok`. An empty server key never validates.
pub fn verify_notification(notification: &TransactionNotification, server_key: &str) -> Result<(), MidtransApiError> {
    if server_key.is_empty() {
        warn!("💳️ No Midtrans server key is configured. Rejecting notification for {}", notification.order_id);
        return Err(MidtransApiError::InvalidSignature);
    }
    let expected = notification_signature(
        &notification.order_id,
        &notification.status_code,
        &notification.gross_amount,
        server_key,
    );
    if constant_time_eq(&expected, &notification.signature_key.to_ascii_lowercase()) {
        Ok(())
    } else {
        warn!("💳️ Invalid signature on notification for {}", notification.order_id);
        Err(MidtransApiError::InvalidSignature)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().iter().zip(b.as_bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
