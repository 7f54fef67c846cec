use chrono::Utc;
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use super::{first_row, single_row};

use crate::db_types::{Delivery, DeliveryFile, DeliveryStatus, NewDelivery};

pub async fn insert_delivery(delivery: NewDelivery, conn: &mut SqliteConnection) -> Result<Delivery, sqlx::Error> {
    let delivery: Delivery = sqlx::query_as(
        r#"
            INSERT INTO deliveries (
                order_id,
                seller_id,
                buyer_id,
                description,
                files,
                status,
                delivery_date,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $7)
            RETURNING *;
        "#,
    )
    .bind(delivery.order_id)
    .bind(delivery.seller_id)
    .bind(delivery.buyer_id)
    .bind(delivery.description)
    .bind(Json(delivery.files))
    .bind(DeliveryStatus::Delivered)
    .bind(Utc::now())
    .fetch_all(conn)
    .await
    .and_then(single_row)?;
    debug!("📝️ Delivery {} for order {} inserted with {} files", delivery.id, delivery.order_id, delivery.files.len());
    Ok(delivery)
}

pub async fn fetch_delivery(delivery_id: i64, conn: &mut SqliteConnection) -> Result<Option<Delivery>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM deliveries WHERE id = $1").bind(delivery_id).fetch_optional(conn).await
}

pub async fn fetch_deliveries_for_user(
    user_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Delivery>, sqlx::Error> {
    match user_id {
        Some(uid) => {
            sqlx::query_as("SELECT * FROM deliveries WHERE buyer_id = $1 OR seller_id = $1 ORDER BY id DESC")
                .bind(uid)
                .fetch_all(conn)
                .await
        },
        None => sqlx::query_as("SELECT * FROM deliveries ORDER BY id DESC").fetch_all(conn).await,
    }
}

pub async fn fetch_deliveries_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Delivery>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM deliveries WHERE order_id = $1 ORDER BY id DESC").bind(order_id).fetch_all(conn).await
}

/// `DELIVERED -> APPROVED`. Returns `None` if the delivery is not `DELIVERED` anymore.
pub async fn approve(delivery_id: i64, conn: &mut SqliteConnection) -> Result<Option<Delivery>, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            UPDATE deliveries SET status = $1, approved_at = $2, updated_at = $2
            WHERE id = $3 AND status = $4
            RETURNING *;
        "#,
    )
    .bind(DeliveryStatus::Approved)
    .bind(now)
    .bind(delivery_id)
    .bind(DeliveryStatus::Delivered)
    .fetch_all(conn)
    .await
    .map(first_row)
}

/// `DELIVERED -> REVISION_REQUIRED`. Returns `None` if the delivery is not `DELIVERED` anymore.
pub async fn request_revision(
    delivery_id: i64,
    feedback: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Delivery>, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            UPDATE deliveries SET status = $1, feedback = $2, revision_requested_at = $3, updated_at = $3
            WHERE id = $4 AND status = $5
            RETURNING *;
        "#,
    )
    .bind(DeliveryStatus::RevisionRequired)
    .bind(feedback)
    .bind(now)
    .bind(delivery_id)
    .bind(DeliveryStatus::Delivered)
    .fetch_all(conn)
    .await
    .map(first_row)
}

/// Bumps `updated_at` and returns the delivery. Used as the first statement of an edit so that the transaction holds
/// the write lock before the manifest is read.
pub async fn touch(delivery_id: i64, conn: &mut SqliteConnection) -> Result<Option<Delivery>, sqlx::Error> {
    sqlx::query_as("UPDATE deliveries SET updated_at = $1 WHERE id = $2 RETURNING *")
        .bind(Utc::now())
        .bind(delivery_id)
        .fetch_all(conn)
        .await
        .map(first_row)
}

pub async fn update_contents(
    delivery_id: i64,
    description: Option<&str>,
    files: &[DeliveryFile],
    conn: &mut SqliteConnection,
) -> Result<Delivery, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE deliveries SET description = COALESCE($1, description), files = $2, updated_at = $3
            WHERE id = $4
            RETURNING *;
        "#,
    )
    .bind(description)
    .bind(Json(files))
    .bind(Utc::now())
    .bind(delivery_id)
    .fetch_all(conn)
    .await
    .and_then(single_row)
}
