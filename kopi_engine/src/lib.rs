//! Kopi Engine
//!
//! The Kopi engine is the core of the Kopi marketplace: shopping carts, checkout, the order status state machine and
//! the wallet ledger that records the money side of it. It knows nothing about HTTP or the payment provider. The
//! server feeds it authenticated requests and verified provider notifications.
//!
//! The library is divided into these main sections:
//! 1. The backend contracts ([`mod@traits`]) and the SQLite implementation of them ([`SqliteDatabase`]). You should
//!    rarely need to access the database directly. The exception is the data types used in the database. These are
//!    defined in the [`db_types`] module and are public.
//! 2. The public API ([`CartApi`], [`OrderFlowApi`], [`WalletApi`] and [`CatalogApi`]). This is where the business
//!    rules live: quantity rules for carts, atomic checkout, legal status transitions and the ledger side effects of
//!    payment.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain actions
//! occur within the engine. For example, when an order is paid, an `OrderPaidEvent` is emitted.
//! A simple channel-based framework is used so that you can easily hook into these events and perform custom actions.
pub mod db_types;
pub mod events;
mod kopi_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(all(feature = "sqlite", any(feature = "test_utils", test)))]
pub mod test_utils;

pub use kopi_api::{
    cart_api::CartApi,
    catalog_api::CatalogApi,
    order_flow_api::{OrderFlowApi, StatusUpdate},
    order_objects,
    wallet_api::WalletApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{
    CartApiError,
    CartManagement,
    CatalogError,
    CatalogManagement,
    OrderFlowError,
    OrderBackend,
    OrderManagement,
    WalletApiError,
    WalletLedger,
};
