use std::sync::Arc;

use adyen_payment_engine::{
    events::EventProducers,
    CaptureApi,
    NotificationProcessor,
    RefundApi,
    SqliteDatabase,
    TransactionStateApi,
    WebhookHandlerFactory,
};
use adyen_tools::AdyenApi;
use chrono::Utc;
use log::*;
use tokio::task::JoinHandle;

use crate::config::NotificationConfig;

/// Builds the processor that works through stored webhook notifications.
pub fn create_notification_processor(
    db: SqliteDatabase,
    gateway: Arc<AdyenApi>,
    producers: EventProducers,
    config: NotificationConfig,
) -> NotificationProcessor<SqliteDatabase, AdyenApi> {
    let states = TransactionStateApi::new(db.clone(), producers.clone());
    let captures = CaptureApi::new(db.clone(), Arc::clone(&gateway));
    let refunds = RefundApi::new(db.clone(), gateway, states.clone());
    let factory = WebhookHandlerFactory::new(db.clone(), states, captures, refunds);
    NotificationProcessor::new(db, factory, producers)
        .with_batch_size(config.batch_size)
        .with_max_error_count(config.max_error_count)
}

/// Starts the notification worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_notification_worker(
    db: SqliteDatabase,
    gateway: Arc<AdyenApi>,
    producers: EventProducers,
    config: NotificationConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = config.interval.to_std().unwrap_or(std::time::Duration::from_secs(60));
        let mut timer = tokio::time::interval(period);
        let processor = create_notification_processor(db, gateway, producers, config);
        info!("📨️ Notification worker started. Checking for due notifications every {}s", period.as_secs());
        loop {
            timer.tick().await;
            trace!("📨️ Running scheduled notification processing");
            match processor.process_scheduled(Utc::now()).await {
                Ok(summary) if summary.processed + summary.skipped + summary.failed == 0 => {
                    trace!("📨️ No notifications were due");
                },
                Ok(summary) => {
                    info!(
                        "📨️ {} notifications processed, {} skipped, {} failed",
                        summary.processed, summary.skipped, summary.failed
                    );
                },
                Err(e) => {
                    error!("📨️ Error running scheduled notification processing: {e}");
                },
            }
        }
    })
}
