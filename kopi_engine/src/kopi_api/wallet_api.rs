use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewWalletTransaction, Rupiah, WalletTransaction},
    order_objects::{PageRequest, TransactionListing, TransactionQueryFilter},
    traits::{WalletApiError, WalletLedger},
};

/// Read access to the wallet ledger, plus the administrative escape hatches for manual entries and removals.
///
/// Routine entries are never written through this API. They are side effects of order status changes in
/// [`crate::OrderFlowApi`].
pub struct WalletApi<B> {
    db: B,
}

impl<B: Debug> Debug for WalletApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletApi ({:?})", self.db)
    }
}

impl<B> WalletApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> WalletApi<B>
where B: WalletLedger
{
    pub async fn transactions_for_user(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<TransactionListing, WalletApiError> {
        let query = TransactionQueryFilter::default().with_user_id(user_id).with_page(page);
        self.search(query).await
    }

    pub async fn search(&self, query: TransactionQueryFilter) -> Result<TransactionListing, WalletApiError> {
        let page = query.page;
        let (transactions, total) = self.db.search_transactions(query).await?;
        Ok(TransactionListing { transactions, pagination: page.paginate(total) })
    }

    pub async fn balance(&self, user_id: i64) -> Result<Rupiah, WalletApiError> {
        self.db.balance_for_user(user_id).await
    }

    pub async fn transactions_for_order(&self, order_id: i64) -> Result<Vec<WalletTransaction>, WalletApiError> {
        self.db.fetch_transactions_for_order(order_id).await
    }

    /// Records a manual entry. Entries that carry a reference already in the ledger are rejected.
    pub async fn record(&self, transaction: NewWalletTransaction) -> Result<WalletTransaction, WalletApiError> {
        let reference = transaction.reference.clone();
        let user_id = transaction.user_id;
        let entry = self
            .db
            .record_transaction(transaction)
            .await?
            .ok_or_else(|| WalletApiError::DuplicateReference(reference.unwrap_or_default()))?;
        info!("💰️ Manual ledger entry {} of {} recorded for user {user_id}", entry.id, entry.amount);
        Ok(entry)
    }

    pub async fn delete(&self, id: i64) -> Result<(), WalletApiError> {
        if !self.db.delete_transaction(id).await? {
            return Err(WalletApiError::TransactionNotFound(id));
        }
        warn!("💰️ Ledger entry {id} was deleted by an administrator");
        Ok(())
    }
}
