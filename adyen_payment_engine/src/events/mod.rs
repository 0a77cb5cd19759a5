//! Engine events.
//!
//! Components outside the engine (e.g. a storefront sync job or an alerting hook) subscribe to these through
//! [`EventHooks`]. Handlers receive only the event itself.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
