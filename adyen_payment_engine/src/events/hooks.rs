use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, NotificationAbandonedEvent, TransactionStateChangedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub transaction_state_changed: Vec<EventProducer<TransactionStateChangedEvent>>,
    pub notification_abandoned: Vec<EventProducer<NotificationAbandonedEvent>>,
}

impl EventProducers {
    pub async fn publish_transaction_state_changed(&self, event: TransactionStateChangedEvent) {
        for producer in &self.transaction_state_changed {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_notification_abandoned(&self, event: NotificationAbandonedEvent) {
        for producer in &self.notification_abandoned {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_transaction_state_changed: Option<EventHandler<TransactionStateChangedEvent>>,
    pub on_notification_abandoned: Option<EventHandler<NotificationAbandonedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_transaction_state_changed = hooks
            .on_transaction_state_changed
            .map(|f| EventHandler::new("transaction_state_changed", buffer_size, f));
        let on_notification_abandoned =
            hooks.on_notification_abandoned.map(|f| EventHandler::new("notification_abandoned", buffer_size, f));
        Self { on_transaction_state_changed, on_notification_abandoned }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_transaction_state_changed {
            result.transaction_state_changed.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_notification_abandoned {
            result.notification_abandoned.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_transaction_state_changed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_notification_abandoned {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_transaction_state_changed: Option<Handler<TransactionStateChangedEvent>>,
    pub on_notification_abandoned: Option<Handler<NotificationAbandonedEvent>>,
}

impl EventHooks {
    pub fn on_transaction_state_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TransactionStateChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_transaction_state_changed = Some(Arc::new(f));
        self
    }

    pub fn on_notification_abandoned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(NotificationAbandonedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_notification_abandoned = Some(Arc::new(f));
        self
    }
}
