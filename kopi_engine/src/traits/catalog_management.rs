use thiserror::Error;

use crate::db_types::{NewProduct, NewUser, Product, Rupiah, Seller, User};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("User {0} already has a store")]
    DuplicateStore(i64),
    #[error("{0} already exists")]
    DuplicateName(String),
    #[error("Seller {0} does not exist, or the category or unit given for the product does not exist")]
    ProductReferenceNotFound(i64),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Invalid catalogue entry. {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_user(&self, user: NewUser) -> Result<User, CatalogError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, CatalogError>;

    /// Creates the seller profile (store) for an existing user.
    async fn insert_seller(&self, user_id: i64, store_name: &str) -> Result<Seller, CatalogError>;

    async fn insert_category(&self, name: &str) -> Result<i64, CatalogError>;

    async fn insert_unit(&self, name: &str) -> Result<i64, CatalogError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;

    /// Changes the live catalogue price. Prices already captured on order items are unaffected.
    async fn update_product_price(&self, product_id: i64, price: Rupiah) -> Result<Option<Product>, CatalogError>;
}
