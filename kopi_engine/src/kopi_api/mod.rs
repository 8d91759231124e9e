//! # Kopi engine public API
//!
//! The `kopi_api` module exposes the programmatic API for the Kopi marketplace core.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`cart_api`] manages the per-user shopping carts.
//! * [`catalog_api`] populates the catalogue: accounts, stores, categories, units and products.
//! * [`order_flow_api`] is the primary API for checkout and the order status state machine, including the ledger
//!   side effects of monetary transitions and the handling of payment provider notifications.
//! * [`wallet_api`] exposes the wallet ledger: balances, listings and administrative entries.
//!
//! The other submodules in this module are support types for queries and listings.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! For example, to fetch a user's cart:
//!
//! ```rust,ignore
//! use kopi_engine::{CartApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements CartManagement
//! let api = CartApi::new(db);
//! let items = api.cart(user_id).await?;
//! ```
pub mod cart_api;
pub mod catalog_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod wallet_api;
