use adyen_payment_engine::{
    adyen_api::{payment_objects::BasicAuthCredentials, RefundError},
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
    traits::{LedgerManagement, OrderManagement},
};
use adyen_tools::data_objects::NotificationRequest;
use chrono::{Duration, Utc};

async fn paid_order(sys: &TestSystem, number: &str, amount: i64) {
    sys.orders.import_order(sample_order(number, amount, "adyen_cards")).await.unwrap();
    let tx_id = format!("tx-{number}");
    sys.db.set_original_psp_reference(&tx_id, &format!("AUTH-{number}")).await.unwrap();
    sys.states.pay(&tx_id).await.unwrap();
}

async fn deliver(sys: &TestSystem, request: NotificationRequest) {
    let credentials = BasicAuthCredentials::new(NOTIFICATION_USER, NOTIFICATION_PASSWORD);
    sys.receiver.process(&request, Some(&credentials), None).await.unwrap();
    sys.processor.process_scheduled(Utc::now() + Duration::seconds(1)).await.unwrap();
}

fn ledger_entry(tx_id: &str, psp: &str, amount: i64, status: LedgerStatus) -> NewLedgerEntry {
    NewLedgerEntry {
        order_transaction_id: tx_id.to_string(),
        psp_reference: psp.to_string(),
        amount: MinorUnits::from(amount),
        currency: "EUR".to_string(),
        source: LedgerSource::Merchant,
        status,
    }
}

#[tokio::test]
async fn refundable_amount_counts_earlier_refunds() {
    let sys = TestSystem::new(test_config()).await;
    paid_order(&sys, "3001", 1000).await;
    sys.db.insert_refund(ledger_entry("tx-3001", "R1", 400, LedgerStatus::Success)).await.unwrap();
    sys.db.insert_refund(ledger_entry("tx-3001", "R2", 500, LedgerStatus::Failed)).await.unwrap();
    let order = sys.orders.order("order-3001").await.unwrap();
    assert!(!sys.refunds.is_amount_refundable(&order, MinorUnits::from(700)).await.unwrap());
    assert!(sys.refunds.is_amount_refundable(&order, MinorUnits::from(600)).await.unwrap());

    let err = sys.refunds.refund(&order, MinorUnits::from(700)).await.unwrap_err();
    assert!(matches!(err, RefundError::NotRefundable(_)));
    assert_eq!(sys.gateway.refund_count(), 0);
}

#[tokio::test]
async fn refund_requests_are_recorded_as_pending() {
    let sys = TestSystem::new(test_config()).await;
    paid_order(&sys, "3002", 1000).await;
    let refund = sys.refunds.refund_order("order-3002", MinorUnits::from(300)).await.unwrap();
    assert_eq!(refund.status, LedgerStatus::Pending);
    assert_eq!(refund.source, LedgerSource::Merchant);
    assert_eq!(refund.amount.value(), 300);
    {
        let requests = sys.gateway.refunds.lock().unwrap();
        assert_eq!(requests[0].original_reference, "AUTH-3002");
        assert_eq!(requests[0].reference.as_deref(), Some("3002"));
    }
    // The transaction only moves when Adyen confirms the refund
    let tx = sys.db.fetch_transaction("tx-3002").await.unwrap().unwrap();
    assert_eq!(tx.state, TransactionState::Paid);

    deliver(&sys, notification_request(vec![notification_item(&refund.psp_reference, "3002", "REFUND", true, Some(300))]))
        .await;
    let tx = sys.db.fetch_transaction("tx-3002").await.unwrap().unwrap();
    assert_eq!(tx.state, TransactionState::RefundedPartially);
    let refunds = sys.refunds.refunds_for_order("order-3002").await.unwrap();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].status, LedgerStatus::Success);
}

#[tokio::test]
async fn unpaid_orders_cannot_be_refunded() {
    let sys = TestSystem::new(test_config()).await;
    sys.orders.import_order(sample_order("3003", 1000, "adyen_cards")).await.unwrap();
    let err = sys.refunds.refund_order("order-3003", MinorUnits::from(100)).await.unwrap_err();
    assert!(matches!(err, RefundError::NoRefundableTransaction(_)));
    let err = sys.refunds.refund_order("order-0000", MinorUnits::from(100)).await.unwrap_err();
    assert!(matches!(err, RefundError::OrderNotFound(_)));
}

#[tokio::test]
async fn rejected_refunds_are_not_recorded() {
    let sys = TestSystem::new(test_config()).await;
    paid_order(&sys, "3004", 1000).await;
    sys.gateway.answer_refunds_with("[error]");
    let err = sys.refunds.refund_order("order-3004", MinorUnits::from(100)).await.unwrap_err();
    assert!(matches!(err, RefundError::Rejected(_)));
    assert!(sys.refunds.refunds_for_order("order-3004").await.unwrap().is_empty());
}

#[tokio::test]
async fn full_refund_notifications_refund_the_transaction() {
    let sys = TestSystem::new(test_config()).await;
    paid_order(&sys, "3005", 1000).await;
    deliver(&sys, notification_request(vec![notification_item("RFULL", "3005", "REFUND", true, Some(1000))])).await;
    let tx = sys.db.fetch_transaction("tx-3005").await.unwrap().unwrap();
    assert_eq!(tx.state, TransactionState::Refunded);
    let refund = sys.db.fetch_refund_by_psp_reference("tx-3005", "RFULL").await.unwrap().unwrap();
    assert_eq!(refund.source, LedgerSource::Adyen);
    assert_eq!(refund.status, LedgerStatus::Success);
}

#[tokio::test]
async fn a_second_partial_refund_stays_partial() {
    let sys = TestSystem::new(test_config()).await;
    paid_order(&sys, "3006", 1000).await;
    deliver(&sys, notification_request(vec![notification_item("RP1", "3006", "REFUND", true, Some(200))])).await;
    deliver(&sys, notification_request(vec![notification_item("RP2", "3006", "REFUND", true, Some(300))])).await;
    let tx = sys.db.fetch_transaction("tx-3006").await.unwrap().unwrap();
    assert_eq!(tx.state, TransactionState::RefundedPartially);
    assert_eq!(sys.refunds.refunds_for_order("order-3006").await.unwrap().len(), 2);
}

#[tokio::test]
async fn failed_refund_notifications_leave_the_transaction_alone() {
    let sys = TestSystem::new(test_config()).await;
    paid_order(&sys, "3007", 1000).await;
    let refund = sys.refunds.refund_order("order-3007", MinorUnits::from(1000)).await.unwrap();
    deliver(
        &sys,
        notification_request(vec![notification_item(&refund.psp_reference, "3007", "REFUND", false, Some(1000))]),
    )
    .await;
    let tx = sys.db.fetch_transaction("tx-3007").await.unwrap().unwrap();
    assert_eq!(tx.state, TransactionState::Paid);
    let refunds = sys.refunds.refunds_for_order("order-3007").await.unwrap();
    assert_eq!(refunds[0].status, LedgerStatus::Failed);
    // The failed refund no longer counts against the order
    let order = sys.orders.order("order-3007").await.unwrap();
    assert!(sys.refunds.is_amount_refundable(&order, MinorUnits::from(1000)).await.unwrap());
}

#[tokio::test]
async fn cancel_or_refund_cancels_unpaid_transactions() {
    let sys = TestSystem::new(test_config()).await;
    sys.orders.import_order(sample_order("3008", 1000, "adyen_cards")).await.unwrap();
    sys.states.authorize("tx-3008").await.unwrap();
    deliver(&sys, notification_request(vec![notification_item("CR1", "3008", "CANCEL_OR_REFUND", true, Some(1000))]))
        .await;
    let tx = sys.db.fetch_transaction("tx-3008").await.unwrap().unwrap();
    assert_eq!(tx.state, TransactionState::Cancelled);
    assert!(sys.refunds.refunds_for_order("order-3008").await.unwrap().is_empty());
}

#[tokio::test]
async fn refunds_force_a_paid_state_first() {
    let sys = TestSystem::new(test_config()).await;
    sys.orders.import_order(sample_order("3009", 1000, "adyen_cards")).await.unwrap();
    sys.states.authorize("tx-3009").await.unwrap();
    let tx = sys.db.fetch_transaction("tx-3009").await.unwrap().unwrap();
    let tx = sys.refunds.do_refund(&tx, TransactionState::Refunded).await.unwrap();
    assert_eq!(tx.state, TransactionState::Refunded);

    // Refunded transactions cannot be paid, so the retry fails too
    let err = sys.refunds.do_refund(&tx, TransactionState::Refunded).await.unwrap_err();
    assert!(matches!(err, RefundError::Transition(_)));

    let err = sys.refunds.do_refund(&tx, TransactionState::Paid).await.unwrap_err();
    assert!(matches!(err, RefundError::InvalidTarget(TransactionState::Paid)));
}
