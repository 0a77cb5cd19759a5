use sqlx::SqliteConnection;

use crate::{
    db_types::{LedgerStatus, NewLedgerEntry, PaymentCapture},
    traits::AdyenDbError,
};

pub async fn insert_capture(capture: NewLedgerEntry, conn: &mut SqliteConnection) -> Result<PaymentCapture, AdyenDbError> {
    let capture = sqlx::query_as(
        r#"
            INSERT INTO adyen_payment_capture (order_transaction_id, psp_reference, amount, currency, source, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(capture.order_transaction_id)
    .bind(capture.psp_reference)
    .bind(capture.amount.value())
    .bind(capture.currency)
    .bind(capture.source.to_string())
    .bind(capture.status.to_string())
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(capture)
}

pub async fn update_status(
    id: i64,
    status: LedgerStatus,
    conn: &mut SqliteConnection,
) -> Result<PaymentCapture, AdyenDbError> {
    let capture: Option<PaymentCapture> = sqlx::query_as(
        "UPDATE adyen_payment_capture SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status.to_string())
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    capture.ok_or(AdyenDbError::LedgerEntryNotFound(id))
}

pub async fn fetch_by_psp_reference(
    transaction_id: &str,
    psp_reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentCapture>, sqlx::Error> {
    let capture = sqlx::query_as(
        r#"
            SELECT * FROM adyen_payment_capture
            WHERE order_transaction_id = $1 AND psp_reference = $2
            ORDER BY id DESC LIMIT 1
        "#,
    )
    .bind(transaction_id)
    .bind(psp_reference)
    .fetch_optional(conn)
    .await?;
    Ok(capture)
}

pub async fn fetch_for_order(order_id: &str, conn: &mut SqliteConnection) -> Result<Vec<PaymentCapture>, sqlx::Error> {
    let captures = sqlx::query_as(
        r#"
            SELECT adyen_payment_capture.* FROM adyen_payment_capture
            JOIN order_transactions ON adyen_payment_capture.order_transaction_id = order_transactions.transaction_id
            WHERE order_transactions.order_id = $1
            ORDER BY adyen_payment_capture.id
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(captures)
}
