use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransaction, OrderTransaction, TransactionState},
    traits::AdyenDbError,
};

pub async fn insert_transaction(
    order_id: &str,
    currency: &str,
    tx: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<OrderTransaction, AdyenDbError> {
    let tx = sqlx::query_as(
        r#"
            INSERT INTO order_transactions (transaction_id, order_id, payment_method, amount, currency, state)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(tx.transaction_id)
    .bind(order_id)
    .bind(tx.payment_method)
    .bind(tx.amount.value())
    .bind(currency)
    .bind(tx.state.to_string())
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(tx)
}

/// All transactions of the order, oldest first.
pub async fn fetch_transactions_for_order(
    order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderTransaction>, sqlx::Error> {
    let txs = sqlx::query_as("SELECT * FROM order_transactions WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(txs)
}

pub async fn fetch_transaction(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderTransaction>, sqlx::Error> {
    let tx = sqlx::query_as("SELECT * FROM order_transactions WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

pub async fn update_transaction_state(
    transaction_id: &str,
    state: TransactionState,
    conn: &mut SqliteConnection,
) -> Result<OrderTransaction, AdyenDbError> {
    let tx: Option<OrderTransaction> = sqlx::query_as(
        r#"
            UPDATE order_transactions SET state = $1, updated_at = CURRENT_TIMESTAMP
            WHERE transaction_id = $2
            RETURNING *;
        "#,
    )
    .bind(state.to_string())
    .bind(transaction_id)
    .fetch_all(conn)
    .await?
    .pop();
    tx.ok_or_else(|| AdyenDbError::TransactionNotFound(transaction_id.to_string()))
}

pub async fn set_original_psp_reference(
    transaction_id: &str,
    psp_reference: &str,
    conn: &mut SqliteConnection,
) -> Result<OrderTransaction, AdyenDbError> {
    let tx: Option<OrderTransaction> = sqlx::query_as(
        r#"
            UPDATE order_transactions SET original_psp_reference = $1, updated_at = CURRENT_TIMESTAMP
            WHERE transaction_id = $2
            RETURNING *;
        "#,
    )
    .bind(psp_reference)
    .bind(transaction_id)
    .fetch_all(conn)
    .await?
    .pop();
    tx.ok_or_else(|| AdyenDbError::TransactionNotFound(transaction_id.to_string()))
}
