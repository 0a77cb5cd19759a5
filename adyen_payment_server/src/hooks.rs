//! Event hooks the server installs on the engine.
//!
//! Nothing outside the gateway needs to hear about state changes yet, so these hooks only log. They are the place to
//! notify the storefront once it exposes an endpoint for that.
use adyen_payment_engine::events::{EventHandlers, EventHooks};
use futures::{future::ready, FutureExt};
use log::*;

pub const EVENT_BUFFER_SIZE: usize = 128;

pub fn create_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_transaction_state_changed(|ev| {
        let tx = &ev.transaction;
        info!(
            "🔀️ Transaction {} of order {} moved from {} to {}",
            tx.transaction_id,
            tx.order_id,
            ev.old_state,
            ev.new_state()
        );
        ready(()).boxed()
    });
    hooks.on_notification_abandoned(|ev| {
        let n = &ev.notification;
        error!(
            "📨️ Gave up on {} notification #{} ({}) for order {}. It needs attention. Reschedule it from the admin API \
             once the cause is fixed.",
            n.event_code, n.id, n.psp_reference, n.merchant_reference
        );
        ready(()).boxed()
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}
