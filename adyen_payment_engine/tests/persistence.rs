use adyen_payment_engine::{
    adyen_api::{payment_objects::BasicAuthCredentials, StateMachineError},
    db_types::{LedgerSource, LedgerStatus, MinorUnits, NewLedgerEntry, TransactionState},
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
    traits::{LedgerManagement, NotificationManagement, OrderManagement, PaymentRecords},
};

fn ledger_entry(psp_reference: &str, amount: i64) -> NewLedgerEntry {
    NewLedgerEntry {
        order_transaction_id: "tx-6001".to_string(),
        psp_reference: psp_reference.to_string(),
        amount: MinorUnits::from(amount),
        currency: "EUR".to_string(),
        source: LedgerSource::Merchant,
        status: LedgerStatus::Pending,
    }
}

#[tokio::test]
async fn consecutive_transitions_are_persisted() {
    let sys = TestSystem::new(test_config()).await;
    sys.orders.import_order(sample_order("6001", 1000, "adyen_cards")).await.unwrap();

    sys.states.process("tx-6001").await.unwrap();
    let tx = sys.db.fetch_transaction("tx-6001").await.unwrap().unwrap();
    assert_eq!(tx.state, TransactionState::InProgress);

    let tx = sys.states.pay("tx-6001").await.unwrap();
    assert_eq!(tx.state, TransactionState::Paid);
    let tx = sys.db.fetch_transaction("tx-6001").await.unwrap().unwrap();
    assert_eq!(tx.state, TransactionState::Paid);

    let err = sys.states.pay("tx-6001").await.unwrap_err();
    assert!(matches!(err, StateMachineError::IllegalTransition { from: TransactionState::Paid, .. }));
    sys.states.cancel("tx-6001").await.unwrap();
    let tx = sys.db.fetch_transaction("tx-6001").await.unwrap().unwrap();
    assert_eq!(tx.state, TransactionState::Cancelled);
}

#[tokio::test]
async fn ledger_status_updates_are_persisted() {
    let sys = TestSystem::new(test_config()).await;
    sys.orders.import_order(sample_order("6001", 1000, "adyen_cards")).await.unwrap();

    let capture = sys.db.insert_capture(ledger_entry("CAP1", 1000)).await.unwrap();
    sys.db.update_capture_status(capture.id, LedgerStatus::Success).await.unwrap();
    let refund = sys.db.insert_refund(ledger_entry("REF1", 400)).await.unwrap();
    sys.db.update_refund_status(refund.id, LedgerStatus::Failed).await.unwrap();
    let refund = sys.db.insert_refund(ledger_entry("REF2", 300)).await.unwrap();
    sys.db.update_refund_status(refund.id, LedgerStatus::Success).await.unwrap();

    let captures = sys.db.fetch_captures_for_order("order-6001").await.unwrap();
    assert_eq!(captures.len(), 1);
    assert_eq!(captures[0].status, LedgerStatus::Success);
    let refunds = sys.db.fetch_refunds_for_order("order-6001").await.unwrap();
    let statuses = refunds.iter().map(|r| r.status).collect::<Vec<_>>();
    assert_eq!(statuses, vec![LedgerStatus::Failed, LedgerStatus::Success]);
}

#[tokio::test]
async fn notification_flags_are_persisted() {
    let sys = TestSystem::new(test_config()).await;
    let request = notification_request(vec![notification_item("PSP1", "6001", "AUTHORISATION", true, Some(1000))]);
    let credentials = BasicAuthCredentials::new(NOTIFICATION_USER, NOTIFICATION_PASSWORD);
    sys.receiver.process(&request, Some(&credentials), None).await.unwrap();
    let id = sys.db.fetch_notifications_for_reference("6001").await.unwrap()[0].id;

    sys.db.set_notification_processing(id, true).await.unwrap();
    assert!(sys.db.fetch_notification(id).await.unwrap().unwrap().processing);
    sys.db.mark_notification_done(id).await.unwrap();
    let n = sys.db.fetch_notification(id).await.unwrap().unwrap();
    assert!(n.done);
    assert!(!n.processing);
    assert_eq!(sys.db.count_unprocessed_notifications().await.unwrap(), 0);
}

#[tokio::test]
async fn state_data_is_consumed_once() {
    let sys = TestSystem::new(test_config()).await;
    sys.db.save_state_data("token-1", r#"{"paymentMethod":{"type":"scheme"}}"#).await.unwrap();
    sys.db.save_state_data("token-1", r#"{"paymentMethod":{"type":"ideal"}}"#).await.unwrap();
    let data = sys.db.take_state_data("token-1").await.unwrap().unwrap();
    assert!(data.state_data.contains("ideal"));
    assert!(sys.db.take_state_data("token-1").await.unwrap().is_none());
}
