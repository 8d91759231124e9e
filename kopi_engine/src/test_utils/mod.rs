//! Helpers for tests that run against a real, throwaway SQLite database.
pub mod fixtures;
pub mod prepare_env;
