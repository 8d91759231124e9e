//! SQLite backend for the Kopi engine.
//!
//! [`db`] holds the stateless query functions. [`SqliteDatabase`] wraps a connection pool and implements every
//! backend trait on top of them, opening a transaction where an operation touches more than one table.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
