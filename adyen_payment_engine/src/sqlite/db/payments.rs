use sqlx::SqliteConnection;

use crate::{
    db_types::{AdyenPayment, NewAdyenPayment, PaymentResponseRecord, PaymentStateData},
    traits::AdyenDbError,
};

pub async fn insert_adyen_payment(
    payment: NewAdyenPayment,
    conn: &mut SqliteConnection,
) -> Result<AdyenPayment, AdyenDbError> {
    let payment = sqlx::query_as(
        r#"
            INSERT INTO adyen_payment (
                psp_reference,
                merchant_reference,
                merchant_order_reference,
                order_transaction_id,
                payment_method,
                amount_value,
                amount_currency,
                capture_mode
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(payment.psp_reference)
    .bind(payment.merchant_reference)
    .bind(payment.merchant_order_reference)
    .bind(payment.order_transaction_id)
    .bind(payment.payment_method)
    .bind(payment.amount.value.value())
    .bind(payment.amount.currency)
    .bind(payment.capture_mode.to_string())
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(payment)
}

pub async fn fetch_adyen_payments(
    merchant_reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<AdyenPayment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM adyen_payment WHERE merchant_reference = $1 ORDER BY id")
        .bind(merchant_reference)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

pub async fn insert_payment_response(
    transaction_id: &str,
    result_code: &str,
    response: &str,
    conn: &mut SqliteConnection,
) -> Result<PaymentResponseRecord, AdyenDbError> {
    let record = sqlx::query_as(
        r#"
            INSERT INTO adyen_payment_response (order_transaction_id, result_code, response)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(transaction_id)
    .bind(result_code)
    .bind(response)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(record)
}

pub async fn fetch_latest_payment_response(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentResponseRecord>, sqlx::Error> {
    let record = sqlx::query_as(
        "SELECT * FROM adyen_payment_response WHERE order_transaction_id = $1 ORDER BY id DESC LIMIT 1",
    )
    .bind(transaction_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

pub async fn upsert_state_data(
    token: &str,
    state_data: &str,
    conn: &mut SqliteConnection,
) -> Result<PaymentStateData, AdyenDbError> {
    let record = sqlx::query_as(
        r#"
            INSERT INTO adyen_payment_state_data (token, state_data) VALUES ($1, $2)
            ON CONFLICT (token) DO UPDATE SET state_data = excluded.state_data
            RETURNING *;
        "#,
    )
    .bind(token)
    .bind(state_data)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(record)
}

pub async fn delete_state_data(token: &str, conn: &mut SqliteConnection) -> Result<Option<PaymentStateData>, sqlx::Error> {
    let record = sqlx::query_as("DELETE FROM adyen_payment_state_data WHERE token = $1 RETURNING *")
        .bind(token)
        .fetch_all(conn)
        .await?
        .pop();
    Ok(record)
}
