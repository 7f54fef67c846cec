use chrono::Utc;
use log::{debug, trace};
use sqlx::{types::Json, SqliteConnection};

use super::{first_row, single_row};

use crate::db_types::{Chat, Message, NewMessage};

/// Creates the chat for the order if it does not exist yet. The unique index on `order_id` arbitrates concurrent
/// callers: the losers' inserts are silently dropped. Returns the number of rows inserted (zero or one).
///
/// Nothing is inserted if the order does not exist.
pub async fn insert_chat_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO chats (order_id, buyer_id, seller_id, created_at)
            SELECT id, buyer_id, seller_id, $2 FROM orders WHERE id = $1
            ON CONFLICT (order_id) DO NOTHING;
        "#,
    )
    .bind(order_id)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_chat_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Chat>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM chats WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

pub async fn fetch_chat(chat_id: i64, conn: &mut SqliteConnection) -> Result<Option<Chat>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM chats WHERE id = $1").bind(chat_id).fetch_optional(conn).await
}

pub async fn fetch_chats_for_user(
    user_id: i64,
    cursor: Option<i64>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Chat>, sqlx::Error> {
    let chats: Vec<Chat> = sqlx::query_as(
        r#"
            SELECT * FROM chats
            WHERE (buyer_id = $1 OR seller_id = $1) AND ($2 IS NULL OR id < $2)
            ORDER BY id DESC
            LIMIT $3;
        "#,
    )
    .bind(user_id)
    .bind(cursor)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    trace!("📝️ {} chats for user {user_id} before {cursor:?}", chats.len());
    Ok(chats)
}

pub async fn fetch_last_message(chat_id: i64, conn: &mut SqliteConnection) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM messages WHERE chat_id = $1 ORDER BY id DESC LIMIT 1")
        .bind(chat_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_messages(
    chat_id: i64,
    cursor: Option<i64>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM messages
            WHERE chat_id = $1 AND ($2 IS NULL OR id < $2)
            ORDER BY id DESC
            LIMIT $3;
        "#,
    )
    .bind(chat_id)
    .bind(cursor)
    .bind(limit)
    .fetch_all(conn)
    .await
}

pub async fn fetch_message(
    chat_id: i64,
    message_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM messages WHERE id = $1 AND chat_id = $2")
        .bind(message_id)
        .bind(chat_id)
        .fetch_optional(conn)
        .await
}

pub async fn insert_message(message: NewMessage, conn: &mut SqliteConnection) -> Result<Message, sqlx::Error> {
    let message: Message = sqlx::query_as(
        r#"
            INSERT INTO messages (chat_id, sender_id, body, attachments, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(message.chat_id)
    .bind(message.sender_id)
    .bind(message.body)
    .bind(message.attachments.map(Json))
    .bind(Utc::now())
    .fetch_all(conn)
    .await
    .and_then(single_row)?;
    debug!("📝️ Message {} stored in chat {}", message.id, message.chat_id);
    Ok(message)
}

/// Marks one message as read on behalf of `reader_id`. System messages and the reader's own messages are never
/// marked. Returns `None` if no row qualified.
pub async fn mark_message_read(
    chat_id: i64,
    message_id: i64,
    reader_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE messages SET read_at = $1
            WHERE id = $2 AND chat_id = $3 AND read_at IS NULL AND sender_id IS NOT NULL AND sender_id <> $4
            RETURNING *;
        "#,
    )
    .bind(Utc::now())
    .bind(message_id)
    .bind(chat_id)
    .bind(reader_id)
    .fetch_all(conn)
    .await
    .map(first_row)
}

pub async fn mark_all_read(chat_id: i64, reader_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE messages SET read_at = $1
            WHERE chat_id = $2 AND read_at IS NULL AND sender_id IS NOT NULL AND sender_id <> $3;
        "#,
    )
    .bind(Utc::now())
    .bind(chat_id)
    .bind(reader_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn unread_count(chat_id: i64, user_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"
            SELECT COUNT(*) FROM messages
            WHERE chat_id = $1 AND read_at IS NULL AND sender_id IS NOT NULL AND sender_id <> $2;
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}
