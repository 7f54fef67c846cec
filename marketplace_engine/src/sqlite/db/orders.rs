use chrono::Utc;
use log::{debug, trace};
use mkt_common::MinorUnits;
use sqlx::SqliteConnection;

use super::{first_row, single_row};

use crate::db_types::{NewOrder, Order, OrderStatusType};

/// Inserts a new order using the given connection. This is not atomic. Embed the call in a transaction if you need
/// atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let now = Utc::now();
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                service_id,
                buyer_id,
                seller_id,
                status,
                amount,
                currency,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *;
        "#,
    )
    .bind(order.service_id)
    .bind(order.buyer_id)
    .bind(order.seller_id)
    .bind(order.status)
    .bind(order.amount)
    .bind(order.currency)
    .bind(now)
    .fetch_all(conn)
    .await
    .and_then(single_row)?;
    debug!("📝️ Order {} inserted with status {}", order.id, order.status);
    Ok(order)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Orders where the user is a party, newest first. `None` fetches every order.
pub async fn fetch_orders_for_user(
    user_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = match user_id {
        Some(uid) => {
            sqlx::query_as("SELECT * FROM orders WHERE buyer_id = $1 OR seller_id = $1 ORDER BY id DESC")
                .bind(uid)
                .fetch_all(conn)
                .await?
        },
        None => sqlx::query_as("SELECT * FROM orders ORDER BY id DESC").fetch_all(conn).await?,
    };
    trace!("📝️ Fetched {} orders for {user_id:?}", orders.len());
    Ok(orders)
}

/// Conditionally moves the order from `from` to `to`. Returns `None` if the order does not exist or is no longer in
/// the `from` state.
pub async fn update_status(
    order_id: i64,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING *",
    )
    .bind(to)
    .bind(Utc::now())
    .bind(order_id)
    .bind(from)
    .fetch_all(conn)
    .await
    .map(first_row)?;
    match &order {
        Some(_) => debug!("📝️ Order {order_id} moved from {from} to {to}"),
        None => debug!("📝️ Order {order_id} was not in {from}. Status not changed."),
    }
    Ok(order)
}

/// Moves a `PENDING_PAYMENT` order to `PAID` and stamps the gateway reference. Returns `None` if the order was not
/// awaiting payment.
pub async fn mark_paid(
    order_id: i64,
    payment_ref: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, payment_ref = COALESCE($2, payment_ref), updated_at = $3
            WHERE id = $4 AND status = $5
            RETURNING *;
        "#,
    )
    .bind(OrderStatusType::Paid)
    .bind(payment_ref)
    .bind(Utc::now())
    .bind(order_id)
    .bind(OrderStatusType::PendingPayment)
    .fetch_all(conn)
    .await
    .map(first_row)?;
    Ok(order)
}

pub async fn update_amount(
    order_id: i64,
    amount: MinorUnits,
    expected_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET amount = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING *",
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(order_id)
    .bind(expected_status)
    .fetch_all(conn)
    .await
    .map(first_row)?;
    Ok(order)
}

/// Sets the chat id on the order unless one is already set. Returns true if the order was updated.
pub async fn set_chat_id(order_id: i64, chat_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET chat_id = $1, updated_at = $2 WHERE id = $3 AND chat_id IS NULL")
        .bind(chat_id)
        .bind(Utc::now())
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes the order and everything that hangs off it. Call this inside a transaction.
///
/// The first statement is a conditional write on the order row, so the transaction takes the write lock up front and
/// the delete only proceeds if the order is still in `expected_status`. Returns `None` otherwise.
pub async fn delete_order_cascade(
    order_id: i64,
    expected_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> =
        sqlx::query_as("UPDATE orders SET updated_at = $1 WHERE id = $2 AND status = $3 RETURNING *")
            .bind(Utc::now())
            .bind(order_id)
            .bind(expected_status)
            .fetch_all(&mut *conn)
            .await
            .map(first_row)?;
    let Some(order) = order else {
        return Ok(None);
    };
    let messages = sqlx::query("DELETE FROM messages WHERE chat_id IN (SELECT id FROM chats WHERE order_id = $1)")
        .bind(order_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM chats WHERE order_id = $1").bind(order_id).execute(&mut *conn).await?;
    let payments =
        sqlx::query("DELETE FROM payments WHERE order_id = $1").bind(order_id).execute(&mut *conn).await?.rows_affected();
    sqlx::query("DELETE FROM deliveries WHERE order_id = $1").bind(order_id).execute(&mut *conn).await?;
    sqlx::query("DELETE FROM outbox WHERE order_id = $1 AND processed_at IS NULL")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM orders WHERE id = $1").bind(order_id).execute(&mut *conn).await?;
    debug!("📝️ Order {order_id} deleted along with {messages} messages and {payments} payments");
    Ok(Some(order))
}
