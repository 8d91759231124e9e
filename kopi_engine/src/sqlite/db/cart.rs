use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{CartItem, CartUpdate},
    traits::CartApiError,
};

const CART_ITEM_SELECT: &str = r#"
    SELECT
        cart_items.id AS id,
        cart_items.user_id AS user_id,
        cart_items.product_id AS product_id,
        cart_items.quantity AS quantity,
        products.name AS product_name,
        products.price AS price,
        products.seller_id AS seller_id,
        categories.name AS category_name,
        units.name AS unit_name,
        cart_items.created_at AS created_at
    FROM cart_items
        JOIN products ON products.id = cart_items.product_id
        LEFT JOIN categories ON categories.id = products.category_id
        LEFT JOIN units ON units.id = products.unit_id
"#;

pub async fn fetch_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let q = format!("{CART_ITEM_SELECT} WHERE cart_items.user_id = $1 ORDER BY cart_items.id ASC");
    let items = sqlx::query_as(&q).bind(user_id).fetch_all(conn).await?;
    Ok(items)
}

pub async fn fetch_cart_item(
    user_id: i64,
    item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    let q = format!("{CART_ITEM_SELECT} WHERE cart_items.user_id = $1 AND cart_items.id = $2");
    let item = sqlx::query_as(&q).bind(user_id).bind(item_id).fetch_optional(conn).await?;
    Ok(item)
}

/// Inserts the product into the cart, or adds `quantity` to the existing row for the same product.
/// Returns the id of the cart item. The product must already be known to exist; any foreign key failure is reported
/// against the user.
pub async fn upsert_cart_item(
    user_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<i64, CartApiError> {
    let id = sqlx::query_scalar(
        r#"
            INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + excluded.quantity
            RETURNING id;
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_foreign_key_violation() => CartApiError::UserNotFound(user_id),
        _ => CartApiError::from(e),
    })?;
    trace!("🛒️ Cart item {id} now holds product {product_id} for user {user_id}");
    Ok(id)
}

/// Returns `false` if the item is not in the user's cart.
pub async fn set_quantity(
    user_id: i64,
    item_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE cart_items SET quantity = $1 WHERE id = $2 AND user_id = $3")
        .bind(quantity)
        .bind(item_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Applies `delta` in a single statement. If the new quantity would fall below 1 the row is deleted instead.
/// Returns `None` if the item is not in the user's cart.
pub async fn adjust_quantity(
    user_id: i64,
    item_id: i64,
    delta: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartUpdate>, sqlx::Error> {
    let updated = sqlx::query(
        "UPDATE cart_items SET quantity = quantity + $1 WHERE id = $2 AND user_id = $3 AND quantity + $1 >= 1",
    )
    .bind(delta)
    .bind(item_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    if updated.rows_affected() > 0 {
        return Ok(fetch_cart_item(user_id, item_id, conn).await?.map(CartUpdate::Updated));
    }
    let removed = delete_item(user_id, item_id, conn).await?;
    Ok(removed.then_some(CartUpdate::Removed))
}

pub async fn delete_item(user_id: i64, item_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(item_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected())
}
