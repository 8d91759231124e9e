use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType, OrderWithItems, Rupiah, Seller, ShippingPolicy},
    order_objects::OrderQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cannot check out an empty cart")]
    EmptyCart,
    #[error("The order could not be created. {0}")]
    OrderCreationFailed(String),
    #[error("The order total is too large to be charged")]
    TotalTooLarge,
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("An order cannot move from {from} to {to}")]
    IllegalTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("{0} is not a valid order status")]
    InvalidStatus(String),
    #[error("Only cancelled, completed or failed orders can be deleted. This order is {0}")]
    OrderNotDeletable(OrderStatusType),
    #[error("User {0} does not have a seller profile")]
    SellerNotFound(i64),
    #[error("Order {0} kept changing status while it was being updated")]
    StatusConflict(OrderId),
    #[error("Order {order_id} is due {expected}, but the payment provider charged {charged}")]
    AmountMismatch { order_id: OrderId, expected: Rupiah, charged: Rupiah },
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

/// Storage for orders and their line items.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Converts the user's cart into an order in a single atomic transaction:
    ///
    /// 1. Loads the cart. Fails with [`OrderFlowError::EmptyCart`] if it is empty.
    /// 2. Sums `price * quantity` over the cart into `total_amount`, and asks the shipping policy for the fee.
    /// 3. Inserts the order with status `pending`.
    /// 4. Inserts one order item per cart item, snapshotting the current product price.
    /// 5. Clears the cart.
    ///
    /// If the total or the shipping fee does not fit in a [`crate::db_types::Rupiah`], nothing is written and
    /// [`OrderFlowError::TotalTooLarge`] is returned.
    /// If any item insertion fails, nothing is written and [`OrderFlowError::OrderCreationFailed`] is returned. The
    /// cart is left intact.
    async fn checkout(&self, order: NewOrder, shipping: ShippingPolicy) -> Result<OrderWithItems, OrderFlowError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError>;

    /// The line items for the order with internal id `order_id`, in insertion order.
    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderFlowError>;

    /// A page of orders matching the filter, newest first, along with the total number of matches.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<(Vec<Order>, i64), OrderFlowError>;

    async fn fetch_seller_for_user(&self, user_id: i64) -> Result<Option<Seller>, OrderFlowError>;

    /// Compare-and-swap on the order status. The update only happens if the order's status is still `expected`.
    /// Returns the updated order, or `None` if the order does not exist or its status has moved on.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
    ) -> Result<Option<Order>, OrderFlowError>;

    /// Deletes an order and its items, but only if it is currently in `expected` status. Returns `false` if nothing
    /// was deleted.
    async fn delete_order(&self, order_id: &OrderId, expected: OrderStatusType) -> Result<bool, OrderFlowError>;
}
