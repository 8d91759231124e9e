//! Users, sellers and the product catalogue. Checkout and the cart only read these; the writers back the
//! administrative catalogue routes and test seeding.
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, NewUser, Product, Rupiah, Seller, User},
    traits::CatalogError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, CatalogError> {
    let email = user.email.clone();
    let user = sqlx::query_as("INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING *")
        .bind(user.name)
        .bind(user.email)
        .bind(user.role.to_string())
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => CatalogError::DuplicateEmail(email),
            _ => CatalogError::from(e),
        })?;
    Ok(user)
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn insert_seller(user_id: i64, store_name: &str, conn: &mut SqliteConnection) -> Result<Seller, CatalogError> {
    let seller = sqlx::query_as("INSERT INTO sellers (user_id, store_name) VALUES ($1, $2) RETURNING *")
        .bind(user_id)
        .bind(store_name)
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_foreign_key_violation() => CatalogError::UserNotFound(user_id),
            sqlx::Error::Database(err) if err.is_unique_violation() => CatalogError::DuplicateStore(user_id),
            _ => CatalogError::from(e),
        })?;
    Ok(seller)
}

pub async fn fetch_seller_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Seller>, sqlx::Error> {
    let seller =
        sqlx::query_as("SELECT * FROM sellers WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(seller)
}

pub async fn insert_category(name: &str, conn: &mut SqliteConnection) -> Result<i64, CatalogError> {
    let id = sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(conn)
        .await
        .map_err(|e| duplicate_name(e, format!("Category {name}")))?;
    Ok(id)
}

pub async fn insert_unit(name: &str, conn: &mut SqliteConnection) -> Result<i64, CatalogError> {
    let id = sqlx::query_scalar("INSERT INTO units (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(conn)
        .await
        .map_err(|e| duplicate_name(e, format!("Unit {name}")))?;
    Ok(id)
}

fn duplicate_name(e: sqlx::Error, what: String) -> CatalogError {
    match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => CatalogError::DuplicateName(what),
        _ => CatalogError::from(e),
    }
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, CatalogError> {
    let seller_id = product.seller_id;
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (seller_id, category_id, unit_id, name, price) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(product.seller_id)
    .bind(product.category_id)
    .bind(product.unit_id)
    .bind(product.name)
    .bind(product.price)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_foreign_key_violation() => CatalogError::ProductReferenceNotFound(seller_id),
        _ => CatalogError::from(e),
    })?;
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn update_product_price(
    product_id: i64,
    price: Rupiah,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as(
        "UPDATE products SET price = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(price)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(product)
}
