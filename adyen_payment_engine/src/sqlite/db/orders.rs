use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{DeliveryState, NewDelivery, NewLineItem, NewOrder, Order, OrderDelivery, OrderLineItem},
    sqlite::db::transactions,
    traits::AdyenDbError,
};

/// Inserts the order and its children, returning `false` in the second parameter if the order already exists.
///
/// This is not atomic. Call it inside a transaction and pass `&mut *tx` as the connection.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<(Order, bool), AdyenDbError> {
    if let Some(existing) = fetch_order_by_order_id(&order.order_id, conn).await? {
        debug!("🗃️ Order [{}] already exists", existing.order_id);
        return Ok((existing, false));
    }
    let NewOrder { line_items, deliveries, transactions: txs, .. } = order.clone();
    let inserted = insert_order(&order, conn).await?;
    for item in line_items {
        insert_line_item(&inserted.order_id, item, conn).await?;
    }
    for delivery in deliveries {
        insert_delivery(&inserted.order_id, delivery, conn).await?;
    }
    for tx in txs {
        transactions::insert_transaction(&inserted.order_id, &inserted.currency, tx, conn).await?;
    }
    debug!("🗃️ Order [{}] #{} inserted with id {}", inserted.order_id, inserted.order_number, inserted.id);
    Ok((inserted, true))
}

async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, AdyenDbError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                order_number,
                sales_channel_id,
                customer_id,
                customer_email,
                amount_total,
                currency
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.order_number)
    .bind(&order.sales_channel_id)
    .bind(&order.customer_id)
    .bind(&order.customer_email)
    .bind(order.amount_total.value())
    .bind(&order.currency)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(order)
}

async fn insert_line_item(
    order_id: &str,
    item: NewLineItem,
    conn: &mut SqliteConnection,
) -> Result<OrderLineItem, AdyenDbError> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_line_items (
                order_id,
                line_item_id,
                label,
                product_number,
                quantity,
                unit_price,
                total_price,
                tax_amount,
                tax_rate
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.line_item_id)
    .bind(item.label)
    .bind(item.product_number)
    .bind(item.quantity)
    .bind(item.unit_price.value())
    .bind(item.total_price.value())
    .bind(item.tax_amount.value())
    .bind(item.tax_rate)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(item)
}

async fn insert_delivery(
    order_id: &str,
    delivery: NewDelivery,
    conn: &mut SqliteConnection,
) -> Result<OrderDelivery, AdyenDbError> {
    let delivery = sqlx::query_as(
        r#"
            INSERT INTO order_deliveries (order_id, delivery_id, state, shipping_costs)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(delivery.delivery_id)
    .bind(delivery.state.to_string())
    .bind(delivery.shipping_costs.value())
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(delivery)
}

pub async fn fetch_order_by_order_id(order_id: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_number(
    order_number: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_number = $1").bind(order_number).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_line_items(order_id: &str, conn: &mut SqliteConnection) -> Result<Vec<OrderLineItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_line_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn fetch_deliveries(order_id: &str, conn: &mut SqliteConnection) -> Result<Vec<OrderDelivery>, sqlx::Error> {
    let deliveries = sqlx::query_as("SELECT * FROM order_deliveries WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(deliveries)
}

pub async fn update_delivery_state(
    order_id: &str,
    delivery_id: &str,
    state: DeliveryState,
    conn: &mut SqliteConnection,
) -> Result<OrderDelivery, AdyenDbError> {
    let delivery: Option<OrderDelivery> = sqlx::query_as(
        r#"
            UPDATE order_deliveries SET state = $1, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $2 AND delivery_id = $3
            RETURNING *;
        "#,
    )
    .bind(state.to_string())
    .bind(order_id)
    .bind(delivery_id)
    .fetch_all(conn)
    .await?
    .pop();
    delivery.ok_or_else(|| AdyenDbError::DeliveryNotFound(delivery_id.to_string()))
}
