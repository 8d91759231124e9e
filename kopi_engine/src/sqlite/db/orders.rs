use log::{debug, trace, warn};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{CartItem, NewOrder, Order, OrderId, OrderItem, OrderStatusType, Rupiah},
    order_objects::OrderQueryFilter,
};

/// Inserts a new `pending` order header using the given connection. This is not atomic. Checkout embeds this call
/// inside a transaction, passing `&mut *tx` as the connection argument.
pub async fn insert_order(
    order_id: &OrderId,
    order: &NewOrder,
    total_amount: Rupiah,
    shipping_fee: Rupiah,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                user_id,
                total_amount,
                shipping_fee,
                shipping_address,
                payment_method,
                notes,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(order.user_id)
    .bind(total_amount)
    .bind(shipping_fee)
    .bind(&order.shipping_address)
    .bind(&order.payment_method)
    .bind(&order.notes)
    .fetch_one(conn)
    .await?;
    debug!("📦️ Order [{}] inserted with id {}", order.order_id, order.id);
    Ok(order)
}

/// How many references checkout draws before giving up on finding one that is not taken.
const MAX_ORDER_ID_ATTEMPTS: usize = 5;

/// Inserts the order header under the first reference from `next_id` that is not already in use. A clash only fails
/// the statement, so this is safe to call inside an open transaction.
pub async fn insert_order_with_fresh_id<F>(
    order: &NewOrder,
    total_amount: Rupiah,
    shipping_fee: Rupiah,
    mut next_id: F,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error>
where
    F: FnMut() -> OrderId,
{
    let mut attempt = 1;
    loop {
        let order_id = next_id();
        match insert_order(&order_id, order, total_amount, shipping_fee, &mut *conn).await {
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() && attempt < MAX_ORDER_ID_ATTEMPTS => {
                warn!("📦️ Order reference {order_id} is already taken. Drawing another.");
                attempt += 1;
            },
            result => return result,
        }
    }
}

/// Snapshots a cart line into the order. The price is whatever the product cost when the cart was loaded.
pub async fn insert_order_item(order_id: i64, item: &CartItem, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let id = sqlx::query_scalar(
        "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.price)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as(
        r#"
        SELECT
            order_items.id AS id,
            order_items.order_id AS order_id,
            order_items.product_id AS product_id,
            products.name AS product_name,
            order_items.quantity AS quantity,
            order_items.price AS price
        FROM order_items JOIN products ON products.id = order_items.product_id
        WHERE order_items.order_id = $1
        ORDER BY order_items.id ASC"#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

fn push_order_filter<'a>(builder: &mut QueryBuilder<'a, Sqlite>, query: &OrderQueryFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(user_id) = query.user_id {
        builder.push(" AND user_id = ");
        builder.push_bind(user_id);
    }
    if let Some(seller_id) = query.seller_id {
        builder.push(
            " AND id IN (SELECT order_items.order_id FROM order_items JOIN products ON products.id = \
             order_items.product_id WHERE products.seller_id = ",
        );
        builder.push_bind(seller_id);
        builder.push(")");
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ");
        builder.push_bind(status.to_string());
    }
}

/// Fetches a page of orders according to the criteria in the `OrderQueryFilter`, along with the total number of
/// matching orders.
///
/// Resulting orders are ordered by `created_at` in descending order. Ties are broken by `id`, newest first.
pub async fn search_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Order>, i64), sqlx::Error> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_order_filter(&mut count, &query);
    trace!("📦️ Executing query: {}", count.sql());
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_order_filter(&mut builder, &query);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(query.page.limit());
    builder.push(" OFFSET ");
    builder.push_bind(query.page.offset());
    trace!("📦️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📦️ Result of search_orders: {} of {total}", orders.len());
    Ok((orders, total))
}

/// Compare-and-swap. Only updates the order if its status is still `expected`.
pub(crate) async fn update_order_status(
    order_id: &OrderId,
    expected: OrderStatusType,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let result = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 AND status = $3 RETURNING *",
    )
    .bind(new_status.to_string())
    .bind(order_id.as_str())
    .bind(expected.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Order items are removed by the cascade on `order_items.order_id`.
pub(crate) async fn delete_order(
    order_id: &OrderId,
    expected: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM orders WHERE order_id = $1 AND status = $2")
        .bind(order_id.as_str())
        .bind(expected.to_string())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
