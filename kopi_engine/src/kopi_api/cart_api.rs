use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CartItem, CartUpdate},
    traits::{CartApiError, CartManagement},
};

/// Per-user cart operations. All methods take the id of the user making the request, and never touch another
/// user's items.
pub struct CartApi<B> {
    db: B,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?})", self.db)
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub async fn cart(&self, user_id: i64) -> Result<Vec<CartItem>, CartApiError> {
        self.db.fetch_cart(user_id).await
    }

    pub async fn add_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartApiError> {
        if quantity < 1 {
            return Err(CartApiError::InvalidQuantity(quantity));
        }
        let item = self.db.add_to_cart(user_id, product_id, quantity).await?;
        debug!("🛒️ User {user_id} added {quantity} of product {product_id}. Cart line is now {}", item.quantity);
        Ok(item)
    }

    /// Sets the quantity of an item outright. A quantity below 1 removes the item, whether or not it exists.
    pub async fn set_quantity(&self, user_id: i64, item_id: i64, quantity: i64) -> Result<CartUpdate, CartApiError> {
        if quantity < 1 {
            let removed = self.db.remove_cart_item(user_id, item_id).await?;
            trace!("🛒️ Quantity {quantity} for item {item_id} removes it (removed: {removed})");
            return Ok(CartUpdate::Removed);
        }
        self.db
            .set_cart_item_quantity(user_id, item_id, quantity)
            .await?
            .map(CartUpdate::Updated)
            .ok_or(CartApiError::ItemNotFound(item_id))
    }

    pub async fn increment(&self, user_id: i64, item_id: i64) -> Result<CartUpdate, CartApiError> {
        self.adjust(user_id, item_id, 1).await
    }

    /// Decrementing an item with a quantity of 1 removes it from the cart.
    pub async fn decrement(&self, user_id: i64, item_id: i64) -> Result<CartUpdate, CartApiError> {
        self.adjust(user_id, item_id, -1).await
    }

    async fn adjust(&self, user_id: i64, item_id: i64, delta: i64) -> Result<CartUpdate, CartApiError> {
        let update = self
            .db
            .adjust_cart_item_quantity(user_id, item_id, delta)
            .await?
            .ok_or(CartApiError::ItemNotFound(item_id))?;
        trace!("🛒️ Adjusted item {item_id} by {delta} for user {user_id}");
        Ok(update)
    }

    /// Removing an item that is not in the cart is not an error.
    pub async fn remove(&self, user_id: i64, item_id: i64) -> Result<(), CartApiError> {
        let removed = self.db.remove_cart_item(user_id, item_id).await?;
        if !removed {
            debug!("🛒️ Item {item_id} was not in the cart of user {user_id}");
        }
        Ok(())
    }

    pub async fn clear(&self, user_id: i64) -> Result<u64, CartApiError> {
        let count = self.db.clear_cart(user_id).await?;
        debug!("🛒️ Cleared {count} items from the cart of user {user_id}");
        Ok(count)
    }
}
