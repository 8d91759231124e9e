use std::fmt::Display;

use serde::{Deserialize, Serialize};

//--------------------------------------   Snap transaction request   ----------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapTransactionRequest {
    pub transaction_details: TransactionDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub item_details: Vec<ItemDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub order_id: String,
    /// Whole rupiah. Midtrans rejects fractional IDR amounts.
    pub gross_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
}

impl SnapTransactionRequest {
    pub fn new<S: Into<String>>(order_id: S, gross_amount: i64) -> Self {
        Self {
            transaction_details: TransactionDetails { order_id: order_id.into(), gross_amount },
            customer_details: None,
            item_details: vec![],
        }
    }

    pub fn with_customer<S1: Into<String>, S2: Into<String>>(mut self, first_name: S1, email: S2) -> Self {
        self.customer_details = Some(CustomerDetails { first_name: first_name.into(), email: email.into() });
        self
    }

    pub fn with_items(mut self, items: Vec<ItemDetail>) -> Self {
        self.item_details = items;
        self
    }

    pub fn order_id(&self) -> &str {
        self.transaction_details.order_id.as_str()
    }

    pub fn gross_amount(&self) -> i64 {
        self.transaction_details.gross_amount
    }
}

/// The response to a successful Snap transaction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapToken {
    pub token: String,
    pub redirect_url: String,
}

//--------------------------------------   HTTP notifications   ----------------------------------------------------
/// The body of an HTTP notification from Midtrans. Only the fields needed for signature checking and status mapping
/// are modelled; everything else in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionNotification {
    pub order_id: String,
    pub status_code: String,
    /// Kept as the raw string (e.g. "52000.00") since the signature is computed over the exact text.
    pub gross_amount: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    pub signature_key: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub transaction_time: Option<String>,
}

impl TransactionNotification {
    pub fn status(&self) -> TransactionStatus {
        TransactionStatus::from(self.transaction_status.as_str())
    }

    pub fn fraud(&self) -> Option<FraudStatus> {
        self.fraud_status.as_deref().map(FraudStatus::from)
    }
}

/// A transaction as reported by the Core API status endpoint. Unlike a notification this comes straight from Midtrans
/// over an authenticated connection, so it is the authoritative view of the transaction.
///
/// Midtrans reports lookup failures in the body with HTTP 200, e.g. `{"status_code": "404", ...}`, so everything but
/// `status_code` may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatusResponse {
    pub status_code: String,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub gross_amount: String,
    #[serde(default)]
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl TransactionStatusResponse {
    pub fn status(&self) -> TransactionStatus {
        TransactionStatus::from(self.transaction_status.as_str())
    }

    pub fn fraud(&self) -> Option<FraudStatus> {
        self.fraud_status.as_deref().map(FraudStatus::from)
    }

    /// Status codes in the 4xx and 5xx range mean the lookup itself failed.
    pub fn is_error(&self) -> bool {
        self.status_code.starts_with('4') || self.status_code.starts_with('5')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Capture,
    Settlement,
    Pending,
    Deny,
    Cancel,
    Expire,
    Refund,
    Other(String),
}

impl From<&str> for TransactionStatus {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "capture" => Self::Capture,
            "settlement" => Self::Settlement,
            "pending" => Self::Pending,
            "deny" => Self::Deny,
            "cancel" => Self::Cancel,
            "expire" => Self::Expire,
            "refund" => Self::Refund,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Capture => write!(f, "capture"),
            Self::Settlement => write!(f, "settlement"),
            Self::Pending => write!(f, "pending"),
            Self::Deny => write!(f, "deny"),
            Self::Cancel => write!(f, "cancel"),
            Self::Expire => write!(f, "expire"),
            Self::Refund => write!(f, "refund"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FraudStatus {
    Accept,
    Challenge,
    Deny,
    Other(String),
}

impl From<&str> for FraudStatus {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "accept" => Self::Accept,
            "challenge" => Self::Challenge,
            "deny" => Self::Deny,
            _ => Self::Other(value.to_string()),
        }
    }
}
