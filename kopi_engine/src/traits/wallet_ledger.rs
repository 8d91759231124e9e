use thiserror::Error;

use crate::{
    db_types::{NewWalletTransaction, Rupiah, WalletTransaction},
    order_objects::TransactionQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum WalletApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Wallet transaction {0} does not exist")]
    TransactionNotFound(i64),
    #[error("A wallet transaction with reference {0} already exists")]
    DuplicateReference(String),
    #[error("User {0} or the order for this wallet transaction does not exist")]
    UnknownOwner(i64),
}

impl From<sqlx::Error> for WalletApiError {
    fn from(e: sqlx::Error) -> Self {
        WalletApiError::DatabaseError(e.to_string())
    }
}

/// The append-only record of monetary events.
#[allow(async_fn_in_trait)]
pub trait WalletLedger {
    /// Appends an entry. If the entry carries a `reference` that is already in the ledger, nothing is written and
    /// `None` is returned. This is what makes ledger side effects safe to retry.
    async fn record_transaction(
        &self,
        transaction: NewWalletTransaction,
    ) -> Result<Option<WalletTransaction>, WalletApiError>;

    /// A page of entries matching the filter, newest first, along with the total number of matches.
    async fn search_transactions(
        &self,
        query: TransactionQueryFilter,
    ) -> Result<(Vec<WalletTransaction>, i64), WalletApiError>;

    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<WalletTransaction>, WalletApiError>;

    /// Sum of all `success` entries for the user. Computed on every call.
    async fn balance_for_user(&self, user_id: i64) -> Result<Rupiah, WalletApiError>;

    /// Administrative removal of an entry. Returns `false` if it did not exist.
    async fn delete_transaction(&self, id: i64) -> Result<bool, WalletApiError>;
}
