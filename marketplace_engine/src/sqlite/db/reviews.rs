use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use super::{first_row, single_row};

use crate::db_types::{NewReview, Review};

pub async fn insert_review(review: NewReview, conn: &mut SqliteConnection) -> Result<Review, sqlx::Error> {
    let review: Review = sqlx::query_as(
        r#"
            INSERT INTO reviews (order_id, user_id, rating, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *;
        "#,
    )
    .bind(review.order_id)
    .bind(review.user_id)
    .bind(review.rating)
    .bind(review.comment)
    .bind(Utc::now())
    .fetch_all(conn)
    .await
    .and_then(single_row)?;
    debug!("📝️ Review {} for order {} stored", review.id, review.order_id);
    Ok(review)
}

pub async fn update_review(
    review_id: i64,
    rating: Option<i64>,
    comment: Option<Option<String>>,
    conn: &mut SqliteConnection,
) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE reviews SET
                rating = COALESCE($1, rating),
                comment = CASE WHEN $2 THEN $3 ELSE comment END,
                updated_at = $4
            WHERE id = $5
            RETURNING *;
        "#,
    )
    .bind(rating)
    .bind(comment.is_some())
    .bind(comment.flatten())
    .bind(Utc::now())
    .bind(review_id)
    .fetch_all(conn)
    .await
    .map(first_row)
}

pub async fn delete_review(review_id: i64, conn: &mut SqliteConnection) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as("DELETE FROM reviews WHERE id = $1 RETURNING *")
        .bind(review_id)
        .fetch_all(conn)
        .await
        .map(first_row)
}

pub async fn fetch_review(review_id: i64, conn: &mut SqliteConnection) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM reviews WHERE id = $1").bind(review_id).fetch_optional(conn).await
}

pub async fn fetch_reviews_for_service(
    service_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Review>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT reviews.* FROM reviews JOIN orders ON reviews.order_id = orders.id
            WHERE orders.service_id = $1
            ORDER BY reviews.id DESC;
        "#,
    )
    .bind(service_id)
    .fetch_all(conn)
    .await
}

pub async fn fetch_reviews_for_seller(seller_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Review>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT reviews.* FROM reviews JOIN orders ON reviews.order_id = orders.id
            WHERE orders.seller_id = $1
            ORDER BY reviews.id DESC;
        "#,
    )
    .bind(seller_id)
    .fetch_all(conn)
    .await
}

pub async fn fetch_reviews_involving(
    user_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Review>, sqlx::Error> {
    match user_id {
        Some(uid) => {
            sqlx::query_as(
                r#"
                SELECT reviews.* FROM reviews JOIN orders ON reviews.order_id = orders.id
                WHERE reviews.user_id = $1 OR orders.buyer_id = $1 OR orders.seller_id = $1
                ORDER BY reviews.id DESC;
                "#,
            )
            .bind(uid)
            .fetch_all(conn)
            .await
        },
        None => sqlx::query_as("SELECT * FROM reviews ORDER BY id DESC").fetch_all(conn).await,
    }
}

/// Recomputes the service's rating from scratch. A service with no reviews gets 0/0.
pub async fn refresh_service_rating(service_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            UPDATE services SET
                rating_avg = COALESCE((
                    SELECT AVG(reviews.rating) FROM reviews JOIN orders ON reviews.order_id = orders.id
                    WHERE orders.service_id = $1
                ), 0),
                rating_count = (
                    SELECT COUNT(*) FROM reviews JOIN orders ON reviews.order_id = orders.id
                    WHERE orders.service_id = $1
                )
            WHERE id = $1;
        "#,
    )
    .bind(service_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Recomputes the seller's rating from scratch. A seller with no reviews gets 0/0.
pub async fn refresh_seller_rating(seller_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            UPDATE users SET
                average_rating_as_musician = COALESCE((
                    SELECT AVG(reviews.rating) FROM reviews JOIN orders ON reviews.order_id = orders.id
                    WHERE orders.seller_id = $1
                ), 0),
                total_reviews_as_musician = (
                    SELECT COUNT(*) FROM reviews JOIN orders ON reviews.order_id = orders.id
                    WHERE orders.seller_id = $1
                )
            WHERE id = $1;
        "#,
    )
    .bind(seller_id)
    .execute(conn)
    .await?;
    Ok(())
}
