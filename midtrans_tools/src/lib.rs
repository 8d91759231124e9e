//! # Midtrans tools
//!
//! A thin client for the parts of the Midtrans API used by the Kopi marketplace:
//! * [`MidtransApi::create_transaction`] requests a Snap token for the hosted checkout widget.
//! * [`MidtransApi::transaction_status`] asks the Core API for the current state of a transaction.
//! * [`verify_notification`] authenticates the asynchronous HTTP notifications that Midtrans sends when a transaction
//!   changes state.
mod api;
mod config;
mod data_objects;
mod error;
mod helpers;
mod signature;

pub use api::{MidtransApi, SnapGateway};
pub use config::MidtransConfig;
pub use data_objects::{
    CustomerDetails,
    FraudStatus,
    ItemDetail,
    SnapToken,
    SnapTransactionRequest,
    TransactionDetails,
    TransactionNotification,
    TransactionStatus,
    TransactionStatusResponse,
};
pub use error::MidtransApiError;
pub use helpers::fallback_order_ref;
pub use signature::{notification_signature, verify_notification};
