use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use super::{first_row, single_row};

use crate::db_types::{NewPayment, Payment, PaymentMethod, PaymentStatus, PaymentUpdate};

pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, sqlx::Error> {
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (
                order_id,
                amount,
                currency,
                payment_method,
                status,
                transaction_id,
                description,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.amount)
    .bind(payment.currency)
    .bind(payment.payment_method)
    .bind(payment.status)
    .bind(payment.transaction_id)
    .bind(payment.description)
    .bind(Utc::now())
    .fetch_all(conn)
    .await
    .and_then(single_row)?;
    debug!("📝️ Payment {} for order {} inserted ({})", payment.id, payment.order_id, payment.status);
    Ok(payment)
}

pub async fn fetch_payment(payment_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(payment_id).fetch_optional(conn).await
}

pub async fn fetch_payments_for_user(
    user_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    match user_id {
        Some(uid) => {
            sqlx::query_as(
                r#"
                SELECT payments.* FROM payments JOIN orders ON payments.order_id = orders.id
                WHERE orders.buyer_id = $1 OR orders.seller_id = $1
                ORDER BY payments.id DESC
                "#,
            )
            .bind(uid)
            .fetch_all(conn)
            .await
        },
        None => sqlx::query_as("SELECT * FROM payments ORDER BY id DESC").fetch_all(conn).await,
    }
}

/// The most recent payment for the order and method. Ids are monotonic, so the highest id is the latest attempt.
pub async fn fetch_latest_payment(
    order_id: i64,
    method: PaymentMethod,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 AND payment_method = $2 ORDER BY id DESC LIMIT 1")
        .bind(order_id)
        .bind(method)
        .fetch_optional(conn)
        .await
}

pub async fn set_payment_intent_id(
    payment_id: i64,
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("UPDATE payments SET payment_intent_id = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(intent_id)
        .bind(Utc::now())
        .bind(payment_id)
        .fetch_all(conn)
        .await
        .map(first_row)
}

/// Applies the status update unless it would regress a settled payment. The only change allowed out of a settled
/// state is `completed -> refunded`. Updates that repeat the current status and carry no new transaction id are
/// skipped too.
///
/// Returns the updated payment, or `None` if nothing was written.
pub async fn apply_status_update(
    update: &PaymentUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments SET
                status = $1,
                transaction_id = COALESCE($2, transaction_id),
                updated_at = $3
            WHERE id = $4
              AND (status NOT IN ('completed', 'refunded') OR (status = 'completed' AND $1 = 'refunded'))
              AND (status <> $1 OR COALESCE(transaction_id, '') <> COALESCE($2, transaction_id, ''))
            RETURNING *;
        "#,
    )
    .bind(update.status)
    .bind(update.transaction_id.as_deref())
    .bind(Utc::now())
    .bind(update.payment_id)
    .fetch_all(conn)
    .await
    .map(first_row)?;
    Ok(payment)
}

/// Marks a completed payment as refunded. Returns `None` if the payment is not `completed`.
pub async fn mark_refunded(payment_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("UPDATE payments SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING *")
        .bind(PaymentStatus::Refunded)
        .bind(Utc::now())
        .bind(payment_id)
        .bind(PaymentStatus::Completed)
        .fetch_all(conn)
        .await
        .map(first_row)
}
