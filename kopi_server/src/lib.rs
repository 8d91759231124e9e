//! # Kopi server
//! This crate hosts the HTTP server for the Kopi marketplace backend. It is responsible for:
//! Authenticating requests with bearer JWTs and enforcing role-based access.
//! Exposing the shopping cart, order lifecycle and wallet ledger of [`kopi_engine`] over a JSON API.
//! Issuing Midtrans Snap tokens and receiving Midtrans payment notifications.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/cart`, `/cart/increase`, `/cart/decrease`, `/cart/{id}`: The authenticated user's cart.
//! * `/order`, `/order/user`, `/order/seller`, `/order/admin`, `/order/{id}` and the status transition routes.
//! * `/wallet/transaction`, `/wallet/balance`, `/wallet/superadmin`: The wallet ledger.
//! * `/catalog/user`, `/catalog/seller`, `/catalog/category`, `/catalog/unit`, `/catalog/product`: Administrative
//!   catalogue writes. `/catalog/product/{id}` is public.
//! * `/payment/midtrans/token`: Snap token issuance.
//! * `/payment/notification`: The Midtrans notification webhook.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod payment_routes;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
