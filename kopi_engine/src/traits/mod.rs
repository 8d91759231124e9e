//! # Backend contracts
//!
//! The traits in this module define what a storage backend must provide for the Kopi engine to run on top of it.
//! The APIs in [`crate::kopi_api`] are generic over these traits, so the server (and its tests) never talk to a
//! concrete database directly.
//!
//! * [`CartManagement`] owns the per-user shopping carts.
//! * [`OrderManagement`] owns checkout, order queries and the compare-and-swap status update that the order state
//!   machine is built on.
//! * [`WalletLedger`] is the append-only ledger of monetary events.
//! * [`CatalogManagement`] is the narrow slice of the user and product catalogue that the engine needs. The write
//!   methods back [`crate::CatalogApi`].
mod cart_management;
mod catalog_management;
mod order_management;
mod wallet_ledger;

pub use cart_management::{CartApiError, CartManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use order_management::{OrderFlowError, OrderManagement};
pub use wallet_ledger::{WalletApiError, WalletLedger};

/// Everything [`crate::OrderFlowApi`] needs from a backend: the order store plus the ledger that payment status
/// changes write to.
pub trait OrderBackend: OrderManagement + WalletLedger {}

impl<T> OrderBackend for T where T: OrderManagement + WalletLedger {}
