use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;
use serde::Serialize;

use crate::{
    adyen_api::{errors::WebhookError, webhook_handlers::WebhookHandlerFactory},
    db_types::{latest_adyen_transaction, Notification},
    events::{EventProducers, NotificationAbandonedEvent},
    state_machine::resolve_target_state,
    traits::{AdyenDatabase, AdyenDbError, PaymentGateway},
};

pub const DEFAULT_BATCH_SIZE: i64 = 20;
pub const DEFAULT_MAX_ERROR_COUNT: i64 = 3;
const BASE_RETRY_DELAY_MINUTES: i64 = 5;

/// Counts from one processing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Processed,
    Skipped,
    Failed,
}

/// Works through stored notifications that are due, and reconciles the order transactions they refer to.
pub struct NotificationProcessor<B, G> {
    db: B,
    handlers: WebhookHandlerFactory<B, G>,
    producers: EventProducers,
    batch_size: i64,
    max_error_count: i64,
}

impl<B, G> Debug for NotificationProcessor<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationProcessor(batch: {}, max errors: {})", self.batch_size, self.max_error_count)
    }
}

impl<B, G> NotificationProcessor<B, G> {
    pub fn new(db: B, handlers: WebhookHandlerFactory<B, G>, producers: EventProducers) -> Self {
        Self { db, handlers, producers, batch_size: DEFAULT_BATCH_SIZE, max_error_count: DEFAULT_MAX_ERROR_COUNT }
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_error_count(mut self, max_error_count: i64) -> Self {
        self.max_error_count = max_error_count.max(1);
        self
    }
}

/// How long to wait before retrying a notification that has failed `error_count` times: 5 minutes, doubling with
/// every failure.
pub fn retry_delay(error_count: i64) -> Duration {
    let exponent = (error_count - 1).clamp(0, 16) as u32;
    Duration::minutes(BASE_RETRY_DELAY_MINUTES * 2i64.pow(exponent))
}

impl<B, G> NotificationProcessor<B, G>
where
    B: AdyenDatabase,
    G: PaymentGateway,
{
    /// Processes up to one batch of notifications scheduled at or before `now`.
    pub async fn process_scheduled(&self, now: DateTime<Utc>) -> Result<ProcessingSummary, AdyenDbError> {
        let notifications = self.db.fetch_scheduled_notifications(now, self.batch_size).await?;
        let mut summary = ProcessingSummary::default();
        if notifications.is_empty() {
            trace!("📨️ No notifications are due");
            return Ok(summary);
        }
        debug!("📨️ Processing {} notification(s)", notifications.len());
        for notification in notifications {
            match self.process_one(&notification, now).await {
                Ok(Outcome::Processed) => summary.processed += 1,
                Ok(Outcome::Skipped) => summary.skipped += 1,
                Ok(Outcome::Failed) => summary.failed += 1,
                Err(e) => {
                    error!("📨️ Could not update the status of notification #{}. {e}", notification.id);
                    self.release(notification.id).await;
                    summary.failed += 1;
                },
            }
        }
        info!(
            "📨️ Notification run complete. {} processed, {} skipped, {} failed",
            summary.processed, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    async fn process_one(&self, notification: &Notification, now: DateTime<Utc>) -> Result<Outcome, AdyenDbError> {
        let id = notification.id;
        self.db.set_notification_processing(id, true).await?;
        match self.process_notification(notification).await {
            Ok(true) => {
                self.db.mark_notification_done(id).await?;
                Ok(Outcome::Processed)
            },
            Ok(false) => {
                self.db.mark_notification_done(id).await?;
                Ok(Outcome::Skipped)
            },
            Err(e) => {
                self.record_failure(notification, &e, now).await?;
                Ok(Outcome::Failed)
            },
        }
    }

    /// Clears the processing flag so that the notification is picked up again by the next run.
    async fn release(&self, id: i64) {
        if let Err(e) = self.db.set_notification_processing(id, false).await {
            error!("📨️ Notification #{id} is stuck in processing and must be rescheduled by hand. {e}");
        }
    }

    /// Returns `false` if the notification does not refer to anything the gateway knows about.
    async fn process_notification(&self, notification: &Notification) -> Result<bool, WebhookError> {
        let reference = notification.merchant_reference.as_str();
        let Some(order) = self.db.fetch_order_by_number(reference).await? else {
            warn!("📨️ Notification #{} refers to unknown order {reference}. Skipping it", notification.id);
            return Ok(false);
        };
        let transactions = self.db.fetch_transactions(&order.order_id).await?;
        let Some(tx) = latest_adyen_transaction(transactions) else {
            warn!("📨️ Order {reference} has no Adyen transaction. Skipping notification #{}", notification.id);
            return Ok(false);
        };
        let current_state = tx.state;
        let target_state = resolve_target_state(&notification.event(), notification.success, current_state);
        let handler = self.handlers.create(&notification.event());
        handler.handle_webhook(&tx, notification, target_state, current_state).await?;
        debug!("📨️ Notification #{} ({}) for order {reference} processed", notification.id, notification.event_code);
        Ok(true)
    }

    async fn record_failure(
        &self,
        notification: &Notification,
        error: &WebhookError,
        now: DateTime<Utc>,
    ) -> Result<(), AdyenDbError> {
        let error_count = notification.error_count + 1;
        let retry_at = (error_count < self.max_error_count).then(|| now + retry_delay(error_count));
        match retry_at {
            Some(at) => warn!(
                "📨️ Notification #{} ({} for {}) failed {error_count} time(s). Retrying at {at}. {error}",
                notification.id, notification.event_code, notification.merchant_reference
            ),
            None => error!(
                "📨️ Notification #{} ({} for {}) failed {error_count} times. Giving up. {error}",
                notification.id, notification.event_code, notification.merchant_reference
            ),
        }
        let updated = self.db.record_notification_error(notification.id, &error.to_string(), retry_at).await?;
        if retry_at.is_none() {
            self.producers.publish_notification_abandoned(NotificationAbandonedEvent { notification: updated }).await;
        }
        Ok(())
    }

    /// Puts the notification back in the queue to be processed straight away.
    pub async fn reschedule(&self, notification_id: i64) -> Result<Notification, AdyenDbError> {
        let notification = self.db.reschedule_notification(notification_id, Utc::now()).await?;
        info!("📨️ Notification #{notification_id} has been rescheduled");
        Ok(notification)
    }

    pub async fn notifications_for_order(&self, order_id: &str) -> Result<Vec<Notification>, AdyenDbError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| AdyenDbError::OrderNotFound(order_id.to_string()))?;
        self.db.fetch_notifications_for_reference(&order.order_number).await
    }
}
