use adyen_payment_engine::{
    db_types::{
        AdyenPayment,
        DeliveryState,
        LedgerStatus,
        NewAdyenPayment,
        NewLedgerEntry,
        NewNotification,
        NewOrder,
        Notification,
        Order,
        OrderDelivery,
        OrderLineItem,
        OrderTransaction,
        PaymentCapture,
        PaymentResponseRecord,
        PaymentStateData,
        Refund,
        TransactionState,
    },
    traits::{
        AdyenDatabase,
        AdyenDbError,
        InsertOrderResult,
        LedgerManagement,
        NotificationManagement,
        OrderManagement,
        PaymentRecords,
    },
};
use chrono::{DateTime, Utc};
use mockall::mock;

mock! {
    pub AdyenBackend {}
    impl Clone for AdyenBackend {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for AdyenBackend {
        async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, AdyenDbError>;
        async fn fetch_order_by_order_id(&self, order_id: &str) -> Result<Option<Order>, AdyenDbError>;
        async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, AdyenDbError>;
        async fn fetch_line_items(&self, order_id: &str) -> Result<Vec<OrderLineItem>, AdyenDbError>;
        async fn fetch_deliveries(&self, order_id: &str) -> Result<Vec<OrderDelivery>, AdyenDbError>;
        async fn update_delivery_state(&self, order_id: &str, delivery_id: &str, state: DeliveryState) -> Result<OrderDelivery, AdyenDbError>;
        async fn fetch_transactions(&self, order_id: &str) -> Result<Vec<OrderTransaction>, AdyenDbError>;
        async fn fetch_transaction(&self, transaction_id: &str) -> Result<Option<OrderTransaction>, AdyenDbError>;
        async fn update_transaction_state(&self, transaction_id: &str, state: TransactionState) -> Result<OrderTransaction, AdyenDbError>;
        async fn set_original_psp_reference(&self, transaction_id: &str, psp_reference: &str) -> Result<OrderTransaction, AdyenDbError>;
    }
    impl NotificationManagement for AdyenBackend {
        async fn insert_notification(&self, notification: NewNotification) -> Result<Option<Notification>, AdyenDbError>;
        async fn count_unprocessed_notifications(&self) -> Result<i64, AdyenDbError>;
        async fn fetch_scheduled_notifications(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Notification>, AdyenDbError>;
        async fn fetch_notification(&self, id: i64) -> Result<Option<Notification>, AdyenDbError>;
        async fn fetch_notifications_for_reference(&self, merchant_reference: &str) -> Result<Vec<Notification>, AdyenDbError>;
        async fn set_notification_processing(&self, id: i64, processing: bool) -> Result<Notification, AdyenDbError>;
        async fn mark_notification_done(&self, id: i64) -> Result<Notification, AdyenDbError>;
        async fn record_notification_error(&self, id: i64, message: &str, retry_at: Option<DateTime<Utc>>) -> Result<Notification, AdyenDbError>;
        async fn reschedule_notification(&self, id: i64, at: DateTime<Utc>) -> Result<Notification, AdyenDbError>;
    }
    impl LedgerManagement for AdyenBackend {
        async fn insert_capture(&self, capture: NewLedgerEntry) -> Result<PaymentCapture, AdyenDbError>;
        async fn update_capture_status(&self, id: i64, status: LedgerStatus) -> Result<PaymentCapture, AdyenDbError>;
        async fn fetch_capture_by_psp_reference(&self, transaction_id: &str, psp_reference: &str) -> Result<Option<PaymentCapture>, AdyenDbError>;
        async fn fetch_captures_for_order(&self, order_id: &str) -> Result<Vec<PaymentCapture>, AdyenDbError>;
        async fn insert_refund(&self, refund: NewLedgerEntry) -> Result<Refund, AdyenDbError>;
        async fn update_refund_status(&self, id: i64, status: LedgerStatus) -> Result<Refund, AdyenDbError>;
        async fn fetch_refund_by_psp_reference(&self, transaction_id: &str, psp_reference: &str) -> Result<Option<Refund>, AdyenDbError>;
        async fn fetch_refunds_for_order(&self, order_id: &str) -> Result<Vec<Refund>, AdyenDbError>;
    }
    impl PaymentRecords for AdyenBackend {
        async fn insert_adyen_payment(&self, payment: NewAdyenPayment) -> Result<AdyenPayment, AdyenDbError>;
        async fn fetch_adyen_payments(&self, merchant_reference: &str) -> Result<Vec<AdyenPayment>, AdyenDbError>;
        async fn save_payment_response(&self, transaction_id: &str, result_code: &str, response: &str) -> Result<PaymentResponseRecord, AdyenDbError>;
        async fn fetch_latest_payment_response(&self, transaction_id: &str) -> Result<Option<PaymentResponseRecord>, AdyenDbError>;
        async fn save_state_data(&self, token: &str, state_data: &str) -> Result<PaymentStateData, AdyenDbError>;
        async fn take_state_data(&self, token: &str) -> Result<Option<PaymentStateData>, AdyenDbError>;
    }
    impl AdyenDatabase for AdyenBackend {
        fn url(&self) -> &str;
        async fn close(&mut self) -> Result<(), AdyenDbError>;
    }
}
