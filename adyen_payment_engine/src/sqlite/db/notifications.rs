use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewNotification, Notification},
    traits::AdyenDbError,
};

/// Checks for a stored notification with the same PSP reference, success flag, event code and original reference.
pub async fn is_duplicate(notification: &NewNotification, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"
            SELECT COUNT(*) FROM adyen_notification
            WHERE psp_reference = $1
              AND success = $2
              AND event_code = $3
              AND COALESCE(original_reference, '') = $4
        "#,
    )
    .bind(&notification.psp_reference)
    .bind(notification.success)
    .bind(&notification.event_code)
    .bind(notification.original_reference.as_deref().unwrap_or_default())
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, AdyenDbError> {
    let (amount_value, amount_currency) = match notification.amount {
        Some(amount) => (Some(amount.value.value()), Some(amount.currency)),
        None => (None, None),
    };
    let notification = sqlx::query_as(
        r#"
            INSERT INTO adyen_notification (
                psp_reference,
                original_reference,
                merchant_reference,
                merchant_account_code,
                event_code,
                success,
                amount_value,
                amount_currency,
                payment_method,
                reason,
                live,
                additional_data,
                scheduled_processing_time
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *;
        "#,
    )
    .bind(notification.psp_reference)
    .bind(notification.original_reference)
    .bind(notification.merchant_reference)
    .bind(notification.merchant_account_code)
    .bind(notification.event_code)
    .bind(notification.success)
    .bind(amount_value)
    .bind(amount_currency)
    .bind(notification.payment_method)
    .bind(notification.reason)
    .bind(notification.live)
    .bind(notification.additional_data)
    .bind(notification.scheduled_processing_time)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(notification)
}

pub async fn count_unprocessed(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM adyen_notification WHERE done = FALSE").fetch_one(conn).await?;
    Ok(count)
}

pub async fn fetch_scheduled(
    now: DateTime<Utc>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    trace!("🗃️ Fetching notifications scheduled before {now}");
    let notifications = sqlx::query_as(
        r#"
            SELECT * FROM adyen_notification
            WHERE done = FALSE
              AND processing = FALSE
              AND scheduled_processing_time IS NOT NULL
              AND scheduled_processing_time <= $1
            ORDER BY scheduled_processing_time, id
            LIMIT $2
        "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(notifications)
}

pub async fn fetch_notification(id: i64, conn: &mut SqliteConnection) -> Result<Option<Notification>, sqlx::Error> {
    let notification =
        sqlx::query_as("SELECT * FROM adyen_notification WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(notification)
}

pub async fn fetch_for_reference(
    merchant_reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let notifications = sqlx::query_as("SELECT * FROM adyen_notification WHERE merchant_reference = $1 ORDER BY id")
        .bind(merchant_reference)
        .fetch_all(conn)
        .await?;
    Ok(notifications)
}

pub async fn set_processing(
    id: i64,
    processing: bool,
    conn: &mut SqliteConnection,
) -> Result<Notification, AdyenDbError> {
    let notification: Option<Notification> = sqlx::query_as(
        "UPDATE adyen_notification SET processing = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(processing)
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    notification.ok_or(AdyenDbError::NotificationNotFound(id))
}

pub async fn mark_done(id: i64, conn: &mut SqliteConnection) -> Result<Notification, AdyenDbError> {
    let notification: Option<Notification> = sqlx::query_as(
        r#"
            UPDATE adyen_notification SET done = TRUE, processing = FALSE, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *
        "#,
    )
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    notification.ok_or(AdyenDbError::NotificationNotFound(id))
}

pub async fn record_error(
    id: i64,
    message: &str,
    retry_at: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<Notification, AdyenDbError> {
    let notification: Option<Notification> = sqlx::query_as(
        r#"
            UPDATE adyen_notification SET
                error_count = error_count + 1,
                error_message = $1,
                processing = FALSE,
                done = $2,
                scheduled_processing_time = COALESCE($3, scheduled_processing_time),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $4
            RETURNING *
        "#,
    )
    .bind(message)
    .bind(retry_at.is_none())
    .bind(retry_at)
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    notification.ok_or(AdyenDbError::NotificationNotFound(id))
}

pub async fn reschedule(id: i64, at: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Notification, AdyenDbError> {
    let notification: Option<Notification> = sqlx::query_as(
        r#"
            UPDATE adyen_notification SET
                processing = FALSE,
                done = FALSE,
                scheduled_processing_time = $1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *
        "#,
    )
    .bind(at)
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    notification.ok_or(AdyenDbError::NotificationNotFound(id))
}
