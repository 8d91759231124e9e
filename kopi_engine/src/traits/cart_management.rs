use thiserror::Error;

use crate::db_types::{CartItem, CartUpdate};

#[derive(Debug, Clone, Error)]
pub enum CartApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Cart item {0} does not exist")]
    ItemNotFound(i64),
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),
}

impl From<sqlx::Error> for CartApiError {
    fn from(e: sqlx::Error) -> Self {
        CartApiError::DatabaseError(e.to_string())
    }
}

/// Storage for shopping carts. Every method is scoped to a user: an item id that belongs to somebody else behaves
/// exactly like an item id that does not exist.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// All items in the user's cart, joined with product, category and unit data, in insertion order.
    async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartItem>, CartApiError>;

    async fn fetch_cart_item(&self, user_id: i64, item_id: i64) -> Result<Option<CartItem>, CartApiError>;

    /// Adds `quantity` units of a product. If the product is already in the cart the quantities are summed,
    /// otherwise a new item is created.
    ///
    /// Fails with [`CartApiError::ProductNotFound`] if the product does not exist, and with
    /// [`CartApiError::UserNotFound`] if the user does not.
    async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartApiError>;

    /// Overwrites the quantity of an item. `quantity` must be positive. Returns `None` if the item is not in the
    /// user's cart.
    async fn set_cart_item_quantity(
        &self,
        user_id: i64,
        item_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartApiError>;

    /// Atomically adds `delta` (which may be negative) to an item's quantity. If the result would drop below 1, the
    /// item is deleted instead and [`CartUpdate::Removed`] is returned. Returns `None` if the item is not in the
    /// user's cart.
    async fn adjust_cart_item_quantity(
        &self,
        user_id: i64,
        item_id: i64,
        delta: i64,
    ) -> Result<Option<CartUpdate>, CartApiError>;

    /// Deletes an item. Returns `false` if there was nothing to delete.
    async fn remove_cart_item(&self, user_id: i64, item_id: i64) -> Result<bool, CartApiError>;

    /// Empties the cart, returning the number of items removed.
    async fn clear_cart(&self, user_id: i64) -> Result<u64, CartApiError>;
}
