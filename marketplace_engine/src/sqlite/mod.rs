//! SQLite storage backend for the marketplace engine.
//!
//! [`SqliteDatabase`] implements every management trait. The query functions in [`db`] are grouped by table and take
//! a bare connection, so that the backend can compose them inside a single transaction.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
