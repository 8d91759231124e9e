use chrono::{DateTime, Utc};

/// Builds an order reference for token requests that are not tied to a stored order:
/// `ORDER-<unix millis>-<first five characters of the user id>`.
pub fn fallback_order_ref(user_id: &str, now: DateTime<Utc>) -> String {
    let prefix = user_id.chars().take(5).collect::<String>();
    format!("ORDER-{}-{prefix}", now.timestamp_millis())
}
