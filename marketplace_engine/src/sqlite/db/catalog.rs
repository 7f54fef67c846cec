use chrono::Utc;
use sqlx::SqliteConnection;

use super::single_row;

use crate::db_types::{NewService, NewUser, Service, User};

pub async fn fetch_service(service_id: i64, conn: &mut SqliteConnection) -> Result<Option<Service>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM services WHERE id = $1").bind(service_id).fetch_optional(conn).await
}

pub async fn insert_service(service: NewService, conn: &mut SqliteConnection) -> Result<Service, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO services (owner_id, title, description, base_price, currency, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(service.owner_id)
    .bind(service.title)
    .bind(service.description)
    .bind(service.base_price)
    .bind(service.currency)
    .bind(Utc::now())
    .fetch_all(conn)
    .await
    .and_then(single_row)
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await
}

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    sqlx::query_as("INSERT INTO users (email, display_name, created_at) VALUES ($1, $2, $3) RETURNING *")
        .bind(user.email)
        .bind(user.display_name)
        .bind(Utc::now())
        .fetch_all(conn)
        .await
        .and_then(single_row)
}
