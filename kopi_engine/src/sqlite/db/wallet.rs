use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewWalletTransaction, Rupiah, WalletTransaction},
    order_objects::TransactionQueryFilter,
    traits::WalletApiError,
};

/// Appends a ledger entry. A clash on `reference` writes nothing and returns `None`.
pub async fn insert_transaction(
    tx: NewWalletTransaction,
    conn: &mut SqliteConnection,
) -> Result<Option<WalletTransaction>, WalletApiError> {
    let user_id = tx.user_id;
    let entry: Option<WalletTransaction> = sqlx::query_as(
        r#"
            INSERT INTO wallet_transactions (user_id, order_id, amount, type, status, description, reference)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (reference) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(tx.user_id)
    .bind(tx.order_id)
    .bind(tx.amount)
    .bind(tx.tx_type)
    .bind(tx.status)
    .bind(tx.description)
    .bind(&tx.reference)
    .fetch_optional(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_foreign_key_violation() => WalletApiError::UnknownOwner(user_id),
        _ => WalletApiError::from(e),
    })?;
    match &entry {
        Some(e) => debug!("💰️ Ledger entry {} recorded for user {}: {}", e.id, e.user_id, e.amount),
        None => debug!("💰️ Ledger entry {} already exists. Nothing written.", tx.reference.unwrap_or_default()),
    }
    Ok(entry)
}

fn push_transaction_filter<'a>(builder: &mut QueryBuilder<'a, Sqlite>, query: &TransactionQueryFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(user_id) = query.user_id {
        builder.push(" AND user_id = ");
        builder.push_bind(user_id);
    }
    if let Some(search) = &query.search {
        builder.push(" AND description LIKE ");
        builder.push_bind(format!("%{search}%"));
    }
}

pub async fn search_transactions(
    query: TransactionQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<(Vec<WalletTransaction>, i64), sqlx::Error> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM wallet_transactions");
    push_transaction_filter(&mut count, &query);
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM wallet_transactions");
    push_transaction_filter(&mut builder, &query);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(query.page.limit());
    builder.push(" OFFSET ");
    builder.push_bind(query.page.offset());
    trace!("💰️ Executing query: {}", builder.sql());
    let transactions = builder.build_query_as::<WalletTransaction>().fetch_all(conn).await?;
    Ok((transactions, total))
}

pub async fn fetch_transactions_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<WalletTransaction>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM wallet_transactions WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}

pub async fn balance_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Rupiah, sqlx::Error> {
    let balance: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM wallet_transactions WHERE user_id = $1 AND status = 'success'",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(Rupiah::from(balance))
}

pub async fn delete_transaction(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM wallet_transactions WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
