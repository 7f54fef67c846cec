use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use super::first_row;

use crate::{
    db_types::{OutboxPayload, OutboxTask},
    traits::{OutboxFilter, RetryPlan},
};

/// Records a side effect to be delivered later. The task is due immediately.
///
/// Returns `None` if a task with the same idempotency key already exists.
pub async fn enqueue(payload: OutboxPayload, conn: &mut SqliteConnection) -> Result<Option<OutboxTask>, sqlx::Error> {
    let now = Utc::now();
    let key = payload.idempotency_key();
    let task: Option<OutboxTask> = sqlx::query_as(
        r#"
            INSERT INTO outbox (kind, order_id, payload, idempotency_key, created_at, next_attempt_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (idempotency_key) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(payload.kind())
    .bind(payload.order_id())
    .bind(Json(&payload))
    .bind(&key)
    .bind(now)
    .fetch_all(conn)
    .await
    .map(first_row)?;
    match &task {
        Some(t) => debug!("📝️ Outbox task {} queued ({key})", t.id),
        None => debug!("📝️ Outbox task {key} already exists. Not queued again."),
    }
    Ok(task)
}

pub async fn fetch_due(
    now: DateTime<Utc>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OutboxTask>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM outbox
            WHERE processed_at IS NULL AND failed_at IS NULL AND next_attempt_at <= $1
            ORDER BY id ASC
            LIMIT $2;
        "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(conn)
    .await
}

pub async fn mark_processed(task_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE outbox SET processed_at = $1 WHERE id = $2 AND processed_at IS NULL")
        .bind(Utc::now())
        .bind(task_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn mark_failed(
    task_id: i64,
    error: &str,
    plan: RetryPlan,
    conn: &mut SqliteConnection,
) -> Result<Option<OutboxTask>, sqlx::Error> {
    let (next_attempt_at, failed_at) = match plan {
        RetryPlan::RetryAt(at) => (Some(at), None),
        RetryPlan::GiveUp => (None, Some(Utc::now())),
    };
    sqlx::query_as(
        r#"
            UPDATE outbox SET
                attempts = attempts + 1,
                last_error = $1,
                next_attempt_at = COALESCE($2, next_attempt_at),
                failed_at = $3
            WHERE id = $4
            RETURNING *;
        "#,
    )
    .bind(error)
    .bind(next_attempt_at)
    .bind(failed_at)
    .bind(task_id)
    .fetch_all(conn)
    .await
    .map(first_row)
}

pub async fn fetch_tasks(filter: OutboxFilter, conn: &mut SqliteConnection) -> Result<Vec<OutboxTask>, sqlx::Error> {
    let sql = match filter {
        OutboxFilter::Pending => "SELECT * FROM outbox WHERE processed_at IS NULL AND failed_at IS NULL ORDER BY id",
        OutboxFilter::Failed => "SELECT * FROM outbox WHERE failed_at IS NOT NULL ORDER BY id",
        OutboxFilter::All => "SELECT * FROM outbox ORDER BY id",
    };
    sqlx::query_as(sql).fetch_all(conn).await
}
