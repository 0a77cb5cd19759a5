use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
    Mutex,
};

use adyen_payment_engine::{
    adyen_api::payment_objects::BasicAuthCredentials,
    db_types::TransactionState,
    events::{EventHandlers, EventHooks},
    test_utils::{
        fixtures::{
            notification_item,
            notification_request,
            sample_order,
            test_config,
            NOTIFICATION_PASSWORD,
            NOTIFICATION_USER,
        },
        TestSystem,
    },
    traits::OrderManagement,
};
use chrono::{Duration, Utc};
use futures_util::FutureExt;
use log::*;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::SeqCst)
    }

    /// Waits up to two seconds for the hook to have been called `n` times.
    pub async fn wait_for(&self, n: i32) -> i32 {
        for _ in 0..40 {
            if self.count() >= n {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        self.count()
    }
}

#[tokio::test]
async fn on_transaction_state_changed() {
    let event = HookCalled::default();
    let event_copy = event.clone();
    let states = Arc::new(Mutex::new(Vec::new()));
    let states_copy = Arc::clone(&states);
    let mut hooks = EventHooks::default();
    hooks.on_transaction_state_changed(move |ev| {
        info!("🪝️ {} -> {}", ev.old_state, ev.new_state());
        event_copy.called();
        states_copy.lock().unwrap().push((ev.old_state, ev.new_state()));
        async {}.boxed()
    });
    let handlers = EventHandlers::new(16, hooks);
    let sys = TestSystem::with_producers(test_config(), handlers.producers()).await;
    handlers.start_handlers().await;

    sys.orders.import_order(sample_order("5001", 1000, "adyen_cards")).await.unwrap();
    sys.states.process("tx-5001").await.unwrap();
    sys.states.pay("tx-5001").await.unwrap();
    // Illegal transitions publish nothing
    assert!(sys.states.pay("tx-5001").await.is_err());

    assert_eq!(event.wait_for(2).await, 2);
    let seen = states.lock().unwrap().clone();
    assert!(seen.contains(&(TransactionState::Open, TransactionState::InProgress)));
    assert!(seen.contains(&(TransactionState::InProgress, TransactionState::Paid)));
}

#[tokio::test]
async fn on_notification_abandoned() {
    let event = HookCalled::default();
    let event_copy = event.clone();
    let mut hooks = EventHooks::default();
    hooks.on_notification_abandoned(move |ev| {
        info!("🪝️ Notification #{} abandoned after {} errors", ev.notification.id, ev.notification.error_count);
        event_copy.called();
        async {}.boxed()
    });
    let handlers = EventHandlers::new(16, hooks);
    let sys = TestSystem::with_producers(test_config(), handlers.producers()).await;
    let processor = sys.processor.with_max_error_count(1);
    handlers.start_handlers().await;

    sys.orders.import_order(sample_order("5002", 1000, "adyen_cards")).await.unwrap();
    sys.db.update_transaction_state("tx-5002", TransactionState::Paid).await.unwrap();
    let credentials = BasicAuthCredentials::new(NOTIFICATION_USER, NOTIFICATION_PASSWORD);
    let request = notification_request(vec![notification_item("PSPX", "5002", "REFUND", true, None)]);
    sys.receiver.process(&request, Some(&credentials), None).await.unwrap();
    let summary = processor.process_scheduled(Utc::now() + Duration::seconds(1)).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(event.wait_for(1).await, 1);
}
