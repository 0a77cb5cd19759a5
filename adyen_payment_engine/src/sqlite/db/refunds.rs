use sqlx::SqliteConnection;

use crate::{
    db_types::{LedgerStatus, NewLedgerEntry, Refund},
    traits::AdyenDbError,
};

pub async fn insert_refund(refund: NewLedgerEntry, conn: &mut SqliteConnection) -> Result<Refund, AdyenDbError> {
    let refund = sqlx::query_as(
        r#"
            INSERT INTO adyen_refund (order_transaction_id, psp_reference, amount, currency, source, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(refund.order_transaction_id)
    .bind(refund.psp_reference)
    .bind(refund.amount.value())
    .bind(refund.currency)
    .bind(refund.source.to_string())
    .bind(refund.status.to_string())
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(refund)
}

pub async fn update_status(
    id: i64,
    status: LedgerStatus,
    conn: &mut SqliteConnection,
) -> Result<Refund, AdyenDbError> {
    let refund: Option<Refund> = sqlx::query_as(
        "UPDATE adyen_refund SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status.to_string())
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    refund.ok_or(AdyenDbError::LedgerEntryNotFound(id))
}

pub async fn fetch_by_psp_reference(
    transaction_id: &str,
    psp_reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Refund>, sqlx::Error> {
    let refund = sqlx::query_as(
        r#"
            SELECT * FROM adyen_refund
            WHERE order_transaction_id = $1 AND psp_reference = $2
            ORDER BY id DESC LIMIT 1
        "#,
    )
    .bind(transaction_id)
    .bind(psp_reference)
    .fetch_optional(conn)
    .await?;
    Ok(refund)
}

pub async fn fetch_for_order(order_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Refund>, sqlx::Error> {
    let refunds = sqlx::query_as(
        r#"
            SELECT adyen_refund.* FROM adyen_refund
            JOIN order_transactions ON adyen_refund.order_transaction_id = order_transactions.transaction_id
            WHERE order_transactions.order_id = $1
            ORDER BY adyen_refund.id
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(refunds)
}
