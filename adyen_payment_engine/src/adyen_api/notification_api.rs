use std::{fmt::Debug, sync::Arc};

use adyen_tools::{
    data_objects::{NotificationRequest, NotificationRequestItem},
    hmac::is_valid_signature,
    AdyenConfig,
    AdyenConfigs,
};
use chrono::{Duration, Utc};
use log::*;

use crate::{
    adyen_api::{errors::NotificationReceiverError, payment_objects::BasicAuthCredentials},
    db_types::{EventCode, NewNotification},
    traits::NotificationManagement,
};

pub const ACCEPTED: &str = "[accepted]";

/// Receives Adyen webhook notifications.
///
/// Notifications are authenticated, deduplicated and stored here. Nothing else happens on receipt: the
/// [`crate::NotificationProcessor`] picks them up later, so Adyen always gets a prompt answer.
pub struct NotificationReceiver<B> {
    db: B,
    configs: Arc<AdyenConfigs>,
    delay: Duration,
}

impl<B> Debug for NotificationReceiver<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationReceiver(delay: {}s)", self.delay.num_seconds())
    }
}

impl<B: Clone> Clone for NotificationReceiver<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), configs: Arc::clone(&self.configs), delay: self.delay }
    }
}

impl<B> NotificationReceiver<B> {
    /// Notifications other than `AUTHORISATION` are held back for `delay`, so that the authorisation of a payment is
    /// normally processed before its captures and refunds.
    pub fn new(db: B, configs: Arc<AdyenConfigs>, delay: Duration) -> Self {
        Self { db, configs, delay }
    }
}

impl<B> NotificationReceiver<B>
where B: NotificationManagement
{
    pub async fn process(
        &self,
        request: &NotificationRequest,
        credentials: Option<&BasicAuthCredentials>,
        sales_channel_id: Option<&str>,
    ) -> Result<String, NotificationReceiverError> {
        let config = self.configs.for_sales_channel(sales_channel_id);
        if !config.has_notification_credentials() {
            error!(
                "🔔️ Notification credentials are not configured for sales channel {}. Rejecting notification.",
                sales_channel_id.unwrap_or("default")
            );
            return Err(NotificationReceiverError::Authentication("Notification credentials are not configured".into()));
        }
        let first = request
            .items()
            .next()
            .ok_or_else(|| NotificationReceiverError::Validation("No notification items were sent".into()))?;
        authenticate(config, first, credentials)?;
        let hmac_key = config.hmac_key();
        if !hmac_key.is_empty() {
            for item in request.items() {
                if !hmac_matches(item, hmac_key.reveal()) {
                    warn!("🔔️ Invalid HMAC signature on {} notification {}", item.event_code, item.psp_reference);
                    return Err(NotificationReceiverError::Validation(format!(
                        "Invalid HMAC signature for {}",
                        item.psp_reference
                    )));
                }
            }
        }
        let live = request.is_live();
        let mut stored = 0;
        for item in request.items() {
            let notification = self.new_notification(item, live);
            if self.db.insert_notification(notification).await?.is_some() {
                stored += 1;
            }
        }
        debug!("🔔️ {stored} of {} notification(s) stored", request.notification_items.len());
        let mut response = ACCEPTED.to_string();
        if request.items().any(|i| i.is_test_notification()) {
            let pending = self.db.count_unprocessed_notifications().await?;
            response.push_str(&format!("\n{pending} notification(s) awaiting processing"));
        }
        Ok(response)
    }

    fn new_notification(&self, item: &NotificationRequestItem, live: bool) -> NewNotification {
        let now = Utc::now();
        let scheduled_processing_time = match EventCode::from(item.event_code.as_str()) {
            EventCode::Authorisation => now,
            _ => now + self.delay,
        };
        NewNotification {
            psp_reference: item.psp_reference.clone(),
            original_reference: item.original_reference.clone().filter(|s| !s.is_empty()),
            merchant_reference: item.merchant_reference.clone(),
            merchant_account_code: item.merchant_account_code.clone(),
            event_code: item.event_code.clone(),
            success: item.is_success(),
            amount: item.amount.clone(),
            payment_method: item.payment_method.clone(),
            reason: item.reason.clone(),
            live,
            additional_data: item.additional_data.as_ref().and_then(|d| serde_json::to_string(d).ok()),
            scheduled_processing_time,
        }
    }
}

fn authenticate(
    config: &AdyenConfig,
    item: &NotificationRequestItem,
    credentials: Option<&BasicAuthCredentials>,
) -> Result<(), NotificationReceiverError> {
    let credentials = credentials
        .ok_or_else(|| NotificationReceiverError::Authentication("No basic auth credentials were sent".into()))?;
    if credentials.username != config.notification_username ||
        credentials.password.reveal() != config.notification_password.reveal()
    {
        warn!("🔔️ Notification basic auth failed for user '{}'", credentials.username);
        return Err(NotificationReceiverError::Authentication("Invalid basic auth credentials".into()));
    }
    if item.merchant_account_code != config.merchant_account {
        warn!("🔔️ Notification is for merchant account {}, not ours", item.merchant_account_code);
        return Err(NotificationReceiverError::Authentication("Merchant account mismatch".into()));
    }
    let hmac_key = config.hmac_key();
    if !hmac_key.is_empty() && !hmac_matches(item, hmac_key.reveal()) {
        return Err(NotificationReceiverError::Authentication("Invalid HMAC signature".into()));
    }
    Ok(())
}

fn hmac_matches(item: &NotificationRequestItem, key: &str) -> bool {
    is_valid_signature(item, key).unwrap_or_else(|e| {
        error!("🔔️ Cannot validate notification signatures. {e}");
        false
    })
}
