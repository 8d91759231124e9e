use std::{future::Future, pin::Pin, sync::Arc};

use tokio::task::JoinHandle;

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    LedgerInconsistencyEvent,
    OrderPaidEvent,
    OrderStatusChangedEvent,
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub ledger_inconsistency_producer: Vec<EventProducer<LedgerInconsistencyEvent>>,
}

pub struct EventHandlers {
    pub on_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_ledger_inconsistency: Option<EventHandler<LedgerInconsistencyEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_status_changed = hooks.on_status_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_ledger_inconsistency = hooks.on_ledger_inconsistency.map(|f| EventHandler::new(buffer_size, f));
        Self { on_status_changed, on_order_paid, on_ledger_inconsistency }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_status_changed {
            result.status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_ledger_inconsistency {
            result.ledger_inconsistency_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns every configured handler onto the runtime. Each one exits once all of its producers are dropped.
    pub fn start_handlers(self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(3);
        if let Some(handler) = self.on_status_changed {
            handles.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_order_paid {
            handles.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_ledger_inconsistency {
            handles.push(tokio::spawn(handler.start_handler()));
        }
        handles
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_ledger_inconsistency: Option<Handler<LedgerInconsistencyEvent>>,
}

impl EventHooks {
    pub fn on_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_ledger_inconsistency<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(LedgerInconsistencyEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_ledger_inconsistency = Some(Arc::new(f));
        self
    }
}
