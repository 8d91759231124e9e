//! Order lifecycle events.
//!
//! Components outside the engine register closures in [`EventHooks`]. [`EventHandlers`] turns each hook into a
//! channel-backed handler, and the APIs publish through the matching [`EventProducers`].
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
