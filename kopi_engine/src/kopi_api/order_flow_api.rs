use std::fmt::Debug;

use log::*;
use serde::Serialize;

use crate::{
    db_types::{
        NewOrder,
        NewWalletTransaction,
        Order,
        OrderId,
        OrderStatusType,
        OrderWithItems,
        Requester,
        Rupiah,
        ShippingPolicy,
        StatusActor,
    },
    events::{EventProducers, LedgerInconsistencyEvent, OrderPaidEvent, OrderStatusChangedEvent},
    order_objects::{OrderListing, OrderQueryFilter, PageRequest},
    traits::{OrderFlowError, OrderManagement, WalletLedger},
};

/// How many times a status change is re-evaluated after losing a compare-and-swap race before giving up.
const MAX_STATUS_ATTEMPTS: usize = 3;

/// The outcome of a request to change an order's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum StatusUpdate {
    /// The order moved from `from` to its current status.
    Changed { from: OrderStatusType, order: Order },
    /// The order was already in the requested status. Nothing changed.
    Unchanged { order: Order },
    /// A payment notification asked for a transition that is not legal from the current status, typically because
    /// it arrived late or out of order. Nothing changed.
    Ignored { order: Order },
}

impl StatusUpdate {
    pub fn order(&self) -> &Order {
        match self {
            Self::Changed { order, .. } | Self::Unchanged { order } | Self::Ignored { order } => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Changed { order, .. } | Self::Unchanged { order } | Self::Ignored { order } => order,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// `OrderFlowApi` is the primary API for checkout and for moving orders through their lifecycle, whether at the
/// request of the buyer, an administrator, or the payment provider.
///
/// Entering `paid` or `completed` appends a payment entry to the wallet ledger. The status change always commits
/// first. If the ledger write then fails, the status is kept, the failure is logged and a
/// [`LedgerInconsistencyEvent`] is published. Re-applying the same status retries the ledger write, which is
/// idempotent.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    shipping: ShippingPolicy,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.shipping)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, shipping: ShippingPolicy::default() }
    }

    pub fn with_shipping_policy(mut self, shipping: ShippingPolicy) -> Self {
        self.shipping = shipping;
        self
    }

    pub fn shipping_policy(&self) -> ShippingPolicy {
        self.shipping
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + WalletLedger
{
    /// Converts the user's cart into a `pending` order. See [`OrderManagement::checkout`] for the guarantees.
    pub async fn checkout(&self, order: NewOrder) -> Result<OrderWithItems, OrderFlowError> {
        let user_id = order.user_id;
        let result = self.db.checkout(order, self.shipping).await?;
        debug!("📦️ Checkout complete for user {user_id}: {}", result.order.order_id);
        Ok(result)
    }

    /// Fetches an order with its items on behalf of `requester`. Orders belonging to somebody else are reported as
    /// not found, unless the requester is an admin.
    pub async fn fetch_order(
        &self,
        requester: &Requester,
        order_id: &OrderId,
    ) -> Result<OrderWithItems, OrderFlowError> {
        let order = self.fetch_visible_order(requester, order_id).await?;
        let items = self.db.fetch_order_items(order.id).await?;
        Ok(OrderWithItems { order, items })
    }

    /// [`Self::fetch_order`] without the items.
    pub async fn fetch_order_header(&self, requester: &Requester, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        self.fetch_visible_order(requester, order_id).await
    }

    async fn fetch_visible_order(&self, requester: &Requester, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        match self.db.fetch_order_by_order_id(order_id).await? {
            Some(order) if order.user_id == requester.user_id || requester.is_admin() => Ok(order),
            Some(_) => {
                debug!("📦️ User {} asked for order {order_id}, which belongs to somebody else", requester.user_id);
                Err(OrderFlowError::OrderNotFound(order_id.clone()))
            },
            None => Err(OrderFlowError::OrderNotFound(order_id.clone())),
        }
    }

    /// The requester's own orders, newest first.
    pub async fn orders_for_user(
        &self,
        requester: &Requester,
        status: Option<OrderStatusType>,
        page: PageRequest,
    ) -> Result<OrderListing, OrderFlowError> {
        let mut query = OrderQueryFilter::default().with_user_id(requester.user_id).with_page(page);
        query.status = status;
        self.search_orders(query).await
    }

    /// Orders that contain at least one product sold by the requester's store.
    pub async fn orders_for_seller(
        &self,
        requester: &Requester,
        status: Option<OrderStatusType>,
        page: PageRequest,
    ) -> Result<OrderListing, OrderFlowError> {
        let seller = self
            .db
            .fetch_seller_for_user(requester.user_id)
            .await?
            .ok_or(OrderFlowError::SellerNotFound(requester.user_id))?;
        let mut query = OrderQueryFilter::default().with_seller_id(seller.id).with_page(page);
        query.status = status;
        self.search_orders(query).await
    }

    /// A page of orders matching `query`, with their items.
    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<OrderListing, OrderFlowError> {
        trace!("📦️ Searching orders with {query}");
        let page = query.page;
        let (orders, total) = self.db.search_orders(query).await?;
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.db.fetch_order_items(order.id).await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(OrderListing { orders: result, pagination: page.paginate(total) })
    }

    /// Cancels a pending order on behalf of its owner.
    pub async fn cancel_order(&self, requester: &Requester, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        match self.db.fetch_order_by_order_id(order_id).await? {
            Some(order) if order.user_id == requester.user_id => {},
            _ => return Err(OrderFlowError::OrderNotFound(order_id.clone())),
        }
        let update = self.transition(order_id, OrderStatusType::Cancelled, StatusActor::Customer).await?;
        info!("📦️ Order {order_id} cancelled by user {}", requester.user_id);
        Ok(update.into_order())
    }

    /// Administrative status change. `new_status` is the lowercase status name.
    pub async fn set_status(&self, order_id: &OrderId, new_status: &str) -> Result<StatusUpdate, OrderFlowError> {
        let status = new_status
            .parse::<OrderStatusType>()
            .map_err(|_| OrderFlowError::InvalidStatus(new_status.to_string()))?;
        self.transition(order_id, status, StatusActor::Admin).await
    }

    pub async fn mark_processing(&self, order_id: &OrderId) -> Result<StatusUpdate, OrderFlowError> {
        self.transition(order_id, OrderStatusType::Processing, StatusActor::Admin).await
    }

    pub async fn mark_delivered(&self, order_id: &OrderId) -> Result<StatusUpdate, OrderFlowError> {
        self.transition(order_id, OrderStatusType::Delivered, StatusActor::Admin).await
    }

    pub async fn mark_completed(&self, order_id: &OrderId) -> Result<StatusUpdate, OrderFlowError> {
        self.transition(order_id, OrderStatusType::Completed, StatusActor::Admin).await
    }

    /// Applies a status reported by the payment provider. The notification must already have been authenticated.
    ///
    /// A transition that is not legal from the order's current status is not an error: the provider may deliver
    /// notifications late, twice, or out of order. Such updates come back as [`StatusUpdate::Ignored`].
    pub async fn apply_gateway_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
    ) -> Result<StatusUpdate, OrderFlowError> {
        let update = self.transition(order_id, status, StatusActor::Gateway).await?;
        if let StatusUpdate::Ignored { order } = &update {
            info!("💳️ Ignoring stale notification for {order_id}: {} -> {status} is not a legal move", order.status);
        }
        Ok(update)
    }

    /// Applies a status the payment provider reported together with the amount it charged.
    ///
    /// A monetary status is only accepted if `charged` is exactly what the order owes (total plus shipping).
    /// Otherwise nothing changes and [`OrderFlowError::AmountMismatch`] is returned.
    pub async fn apply_gateway_payment(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        charged: Rupiah,
    ) -> Result<StatusUpdate, OrderFlowError> {
        if status.is_monetary() {
            let order = self
                .db
                .fetch_order_by_order_id(order_id)
                .await?
                .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
            let expected = order.amount_due();
            if charged != expected {
                warn!("💳️ Refusing to mark {order_id} as {status}. It is due {expected} but {charged} was charged");
                return Err(OrderFlowError::AmountMismatch { order_id: order_id.clone(), expected, charged });
            }
        }
        self.apply_gateway_status(order_id, status).await
    }

    /// Deletes an order and its items. Only orders in a terminal status can be deleted.
    pub async fn delete_order(&self, order_id: &OrderId) -> Result<(), OrderFlowError> {
        for _ in 0..MAX_STATUS_ATTEMPTS {
            let order = self
                .db
                .fetch_order_by_order_id(order_id)
                .await?
                .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
            if !order.status.is_terminal() {
                return Err(OrderFlowError::OrderNotDeletable(order.status));
            }
            if self.db.delete_order(order_id, order.status).await? {
                info!("📦️ Order {order_id} ({}) deleted", order.status);
                return Ok(());
            }
        }
        Err(OrderFlowError::StatusConflict(order_id.clone()))
    }

    async fn transition(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
        actor: StatusActor,
    ) -> Result<StatusUpdate, OrderFlowError> {
        for attempt in 1..=MAX_STATUS_ATTEMPTS {
            let order = self
                .db
                .fetch_order_by_order_id(order_id)
                .await?
                .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
            let from = order.status;
            if from == new_status && actor != StatusActor::Customer {
                trace!("📦️ Order {order_id} is already {new_status}");
                self.ensure_ledger_entry(&order, new_status).await;
                return Ok(StatusUpdate::Unchanged { order });
            }
            if !from.can_transition_to(new_status, actor) {
                return match actor {
                    StatusActor::Gateway => Ok(StatusUpdate::Ignored { order }),
                    _ => Err(OrderFlowError::IllegalTransition { from, to: new_status }),
                };
            }
            match self.db.update_order_status(order_id, from, new_status).await? {
                Some(order) => {
                    info!("📦️ Order {order_id} moved from {from} to {new_status} ({actor:?})");
                    self.ensure_ledger_entry(&order, new_status).await;
                    self.publish_status_change(from, &order).await;
                    return Ok(StatusUpdate::Changed { from, order });
                },
                None => {
                    debug!("📦️ Order {order_id} changed status under us (attempt {attempt}). Re-evaluating.");
                },
            }
        }
        warn!("📦️ Gave up changing the status of {order_id} to {new_status} after {MAX_STATUS_ATTEMPTS} attempts");
        Err(OrderFlowError::StatusConflict(order_id.clone()))
    }

    /// Writes the ledger entry for a monetary status, if it is not there already.
    async fn ensure_ledger_entry(&self, order: &Order, status: OrderStatusType) {
        if !status.is_monetary() {
            return;
        }
        let entry = NewWalletTransaction::for_order_status(order, status);
        match self.db.record_transaction(entry).await {
            Ok(Some(tx)) => {
                info!("💰️ Recorded {} for order {} ({status}) as ledger entry {}", tx.amount, order.order_id, tx.id)
            },
            Ok(None) => trace!("💰️ Ledger entry for order {} ({status}) already exists", order.order_id),
            Err(e) => {
                error!(
                    "💰️ Order {} is {status} but its ledger entry could not be written. The ledger is now out of step \
                     with the order. {e}",
                    order.order_id
                );
                for producer in &self.producers.ledger_inconsistency_producer {
                    let event = LedgerInconsistencyEvent::new(order.clone(), status, e.to_string());
                    producer.publish_event(event).await;
                }
            },
        }
    }

    async fn publish_status_change(&self, old_status: OrderStatusType, order: &Order) {
        for producer in &self.producers.status_changed_producer {
            producer.publish_event(OrderStatusChangedEvent::new(old_status, order.clone())).await;
        }
        if order.status == OrderStatusType::Paid {
            for producer in &self.producers.order_paid_producer {
                debug!("📦️ Notifying order paid hook subscribers");
                producer.publish_event(OrderPaidEvent::new(order.clone())).await;
            }
        }
    }
}
