use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType};

/// Emitted after every successful status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }
}

/// Emitted when an order moves into `paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted when an order reached a monetary status but its ledger entry could not be written. The order status is
/// not rolled back, so somebody needs to look at this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerInconsistencyEvent {
    pub order: Order,
    pub status: OrderStatusType,
    pub reason: String,
}

impl LedgerInconsistencyEvent {
    pub fn new<S: Into<String>>(order: Order, status: OrderStatusType, reason: S) -> Self {
        Self { order, status, reason: reason.into() }
    }
}
