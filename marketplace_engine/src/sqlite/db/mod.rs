//! # SQLite database methods
//!
//! Low-level SQLite interactions, one module per table group.
//!
//! These are plain functions that accept a `&mut SqliteConnection` argument. Callers can pass a pooled connection, or
//! open a transaction and pass `&mut *tx` to make several calls atomic, without any other changes.
//!
//! SQLite only upgrades a transaction to a writer when it first writes. Two transactions that both read first and then
//! try to write can fail with `SQLITE_BUSY` regardless of the busy timeout, so every transaction in this crate opens
//! with its conditional `UPDATE` or `INSERT`.
//!
//! Writes with a `RETURNING` clause are always read with `fetch_all` and then narrowed with [`first_row`] or
//! [`single_row`]. SQLite only finishes such a statement, and commits it when no transaction is open, once it has been
//! stepped past its last row. `fetch_one` and `fetch_optional` stop at the first row, which leaves the write invisible
//! to the other connections in the pool.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod catalog;
pub mod chats;
pub mod deliveries;
pub mod orders;
pub mod outbox;
pub mod payments;
pub mod reviews;

const SQLITE_DB_URL: &str = "sqlite://data/marketplace.db";

pub fn db_url() -> String {
    let result = env::var("MKT_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ MKT_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Narrows the drained rows of a `RETURNING` write to the affected row, if any.
pub fn first_row<T>(rows: Vec<T>) -> Option<T> {
    rows.into_iter().next()
}

/// Like [`first_row`], for writes that always affect exactly one row.
pub fn single_row<T>(rows: Vec<T>) -> Result<T, SqlxError> {
    rows.into_iter().next().ok_or(SqlxError::RowNotFound)
}
