use chrono::{DateTime, Utc};

use crate::{
    db_types::{NewNotification, Notification},
    traits::AdyenDbError,
};

#[allow(async_fn_in_trait)]
pub trait NotificationManagement {
    /// Stores the notification unless an identical one (same PSP reference, success flag, event code and original
    /// reference) already exists. Returns `None` for duplicates.
    async fn insert_notification(&self, notification: NewNotification) -> Result<Option<Notification>, AdyenDbError>;

    /// The number of notifications that have not been completely processed yet.
    async fn count_unprocessed_notifications(&self) -> Result<i64, AdyenDbError>;

    /// Fetches up to `limit` notifications that are neither done nor being processed, and whose scheduled processing
    /// time is at or before `now`, oldest first.
    async fn fetch_scheduled_notifications(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Notification>, AdyenDbError>;

    async fn fetch_notification(&self, id: i64) -> Result<Option<Notification>, AdyenDbError>;

    async fn fetch_notifications_for_reference(
        &self,
        merchant_reference: &str,
    ) -> Result<Vec<Notification>, AdyenDbError>;

    async fn set_notification_processing(&self, id: i64, processing: bool) -> Result<Notification, AdyenDbError>;

    async fn mark_notification_done(&self, id: i64) -> Result<Notification, AdyenDbError>;

    /// Increments the error count and stores the error message. If `retry_at` is given, the notification is
    /// rescheduled for that time; otherwise it is marked as done.
    async fn record_notification_error(
        &self,
        id: i64,
        message: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> Result<Notification, AdyenDbError>;

    /// Resets the processing and done flags and schedules the notification for `at`.
    async fn reschedule_notification(&self, id: i64, at: DateTime<Utc>) -> Result<Notification, AdyenDbError>;
}
