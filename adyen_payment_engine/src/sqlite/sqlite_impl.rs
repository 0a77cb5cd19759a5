//! `SqliteDatabase` is a concrete implementation of an Adyen payment engine backend.
//!
//! It uses SQLite as the backend and implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{captures, db_url, new_pool, notifications, orders, payments, refunds, transactions};
use crate::{
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

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `APG_DATABASE_URL` or the default url.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date with the migrations embedded in this crate.
    pub async fn run_migrations(&self) -> Result<(), AdyenDbError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await.map_err(|e| AdyenDbError::DatabaseError(e.to_string()))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}

impl AdyenDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), AdyenDbError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, AdyenDbError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order_by_order_id(&self, order_id: &str) -> Result<Option<Order>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_line_items(&self, order_id: &str) -> Result<Vec<OrderLineItem>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_line_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_deliveries(&self, order_id: &str) -> Result<Vec<OrderDelivery>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let deliveries = orders::fetch_deliveries(order_id, &mut conn).await?;
        Ok(deliveries)
    }

    async fn update_delivery_state(
        &self,
        order_id: &str,
        delivery_id: &str,
        state: DeliveryState,
    ) -> Result<OrderDelivery, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_delivery_state(order_id, delivery_id, state, &mut conn).await
    }

    async fn fetch_transactions(&self, order_id: &str) -> Result<Vec<OrderTransaction>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let txs = transactions::fetch_transactions_for_order(order_id, &mut conn).await?;
        Ok(txs)
    }

    async fn fetch_transaction(&self, transaction_id: &str) -> Result<Option<OrderTransaction>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let tx = transactions::fetch_transaction(transaction_id, &mut conn).await?;
        Ok(tx)
    }

    async fn update_transaction_state(
        &self,
        transaction_id: &str,
        state: TransactionState,
    ) -> Result<OrderTransaction, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        transactions::update_transaction_state(transaction_id, state, &mut conn).await
    }

    async fn set_original_psp_reference(
        &self,
        transaction_id: &str,
        psp_reference: &str,
    ) -> Result<OrderTransaction, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        transactions::set_original_psp_reference(transaction_id, psp_reference, &mut conn).await
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Option<Notification>, AdyenDbError> {
        let mut tx = self.pool.begin().await?;
        if notifications::is_duplicate(&notification, &mut tx).await? {
            debug!(
                "🗃️ Notification {} {} for {} is a duplicate",
                notification.event_code, notification.psp_reference, notification.merchant_reference
            );
            tx.rollback().await?;
            return Ok(None);
        }
        let notification = notifications::insert_notification(notification, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(notification))
    }

    async fn count_unprocessed_notifications(&self) -> Result<i64, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let count = notifications::count_unprocessed(&mut conn).await?;
        Ok(count)
    }

    async fn fetch_scheduled_notifications(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Notification>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::fetch_scheduled(now, limit, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_notification(&self, id: i64) -> Result<Option<Notification>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let notification = notifications::fetch_notification(id, &mut conn).await?;
        Ok(notification)
    }

    async fn fetch_notifications_for_reference(
        &self,
        merchant_reference: &str,
    ) -> Result<Vec<Notification>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::fetch_for_reference(merchant_reference, &mut conn).await?;
        Ok(result)
    }

    async fn set_notification_processing(&self, id: i64, processing: bool) -> Result<Notification, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        notifications::set_processing(id, processing, &mut conn).await
    }

    async fn mark_notification_done(&self, id: i64) -> Result<Notification, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_done(id, &mut conn).await
    }

    async fn record_notification_error(
        &self,
        id: i64,
        message: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> Result<Notification, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        notifications::record_error(id, message, retry_at, &mut conn).await
    }

    async fn reschedule_notification(&self, id: i64, at: DateTime<Utc>) -> Result<Notification, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        notifications::reschedule(id, at, &mut conn).await
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn insert_capture(&self, capture: NewLedgerEntry) -> Result<PaymentCapture, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        captures::insert_capture(capture, &mut conn).await
    }

    async fn update_capture_status(&self, id: i64, status: LedgerStatus) -> Result<PaymentCapture, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        captures::update_status(id, status, &mut conn).await
    }

    async fn fetch_capture_by_psp_reference(
        &self,
        transaction_id: &str,
        psp_reference: &str,
    ) -> Result<Option<PaymentCapture>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let capture = captures::fetch_by_psp_reference(transaction_id, psp_reference, &mut conn).await?;
        Ok(capture)
    }

    async fn fetch_captures_for_order(&self, order_id: &str) -> Result<Vec<PaymentCapture>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = captures::fetch_for_order(order_id, &mut conn).await?;
        Ok(result)
    }

    async fn insert_refund(&self, refund: NewLedgerEntry) -> Result<Refund, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        refunds::insert_refund(refund, &mut conn).await
    }

    async fn update_refund_status(&self, id: i64, status: LedgerStatus) -> Result<Refund, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        refunds::update_status(id, status, &mut conn).await
    }

    async fn fetch_refund_by_psp_reference(
        &self,
        transaction_id: &str,
        psp_reference: &str,
    ) -> Result<Option<Refund>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let refund = refunds::fetch_by_psp_reference(transaction_id, psp_reference, &mut conn).await?;
        Ok(refund)
    }

    async fn fetch_refunds_for_order(&self, order_id: &str) -> Result<Vec<Refund>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = refunds::fetch_for_order(order_id, &mut conn).await?;
        Ok(result)
    }
}

impl PaymentRecords for SqliteDatabase {
    async fn insert_adyen_payment(&self, payment: NewAdyenPayment) -> Result<AdyenPayment, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        payments::insert_adyen_payment(payment, &mut conn).await
    }

    async fn fetch_adyen_payments(&self, merchant_reference: &str) -> Result<Vec<AdyenPayment>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let result = payments::fetch_adyen_payments(merchant_reference, &mut conn).await?;
        Ok(result)
    }

    async fn save_payment_response(
        &self,
        transaction_id: &str,
        result_code: &str,
        response: &str,
    ) -> Result<PaymentResponseRecord, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        payments::insert_payment_response(transaction_id, result_code, response, &mut conn).await
    }

    async fn fetch_latest_payment_response(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentResponseRecord>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let record = payments::fetch_latest_payment_response(transaction_id, &mut conn).await?;
        Ok(record)
    }

    async fn save_state_data(&self, token: &str, state_data: &str) -> Result<PaymentStateData, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        payments::upsert_state_data(token, state_data, &mut conn).await
    }

    async fn take_state_data(&self, token: &str) -> Result<Option<PaymentStateData>, AdyenDbError> {
        let mut conn = self.pool.acquire().await?;
        let record = payments::delete_state_data(token, &mut conn).await?;
        Ok(record)
    }
}
