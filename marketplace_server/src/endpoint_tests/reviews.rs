use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use marketplace_engine::{
    db_types::{OrderStatusType, Review},
    traits::MarketplaceError,
    ReviewApi,
};
use mockall::predicate::eq;
use serde_json::json;

use super::{
    helpers::{api_request, order, user_token, BUYER, SELLER},
    mocks::MockMarketplace,
};
use crate::routes::{CreateReviewRoute, ReviewsRoute};

fn review(id: i64, order_id: i64, rating: i64) -> Review {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 20, 9, 0, 0).unwrap();
    Review {
        id,
        order_id,
        user_id: BUYER,
        rating,
        comment: Some("Great mix".into()),
        created_at,
        updated_at: created_at,
    }
}

#[actix_web::test]
async fn buyer_reviews_a_completed_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_order().with(eq(8)).returning(|id| Ok(Some(order(id, OrderStatusType::Completed))));
    db.expect_insert_review()
        .withf(|r| r.order_id == 8 && r.user_id == BUYER && r.rating == 5 && r.comment.as_deref() == Some("Great mix"))
        .times(1)
        .returning(|r| Ok(review(1, r.order_id, r.rating)));
    let req = TestRequest::post()
        .uri("/api/reviews")
        .set_json(json!({"orderId": 8, "rating": 5, "comment": "  Great mix  "}));
    let (status, body) = api_request(&user_token(BUYER), req, configure(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    let review: Review = serde_json::from_str(&body).unwrap();
    assert_eq!(review.rating, 5);
}

#[actix_web::test]
async fn second_review_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Completed))));
    db.expect_insert_review()
        .returning(|r| Err(MarketplaceError::AlreadyExists(format!("A review for order {}", r.order_id))));
    let req = TestRequest::post().uri("/api/reviews").set_json(json!({"orderId": 8, "rating": 4}));
    let (status, _) = api_request(&user_token(BUYER), req, configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn unfinished_orders_cannot_be_reviewed() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Delivered))));
    db.expect_insert_review().never();
    let req = TestRequest::post().uri("/api/reviews").set_json(json!({"orderId": 8, "rating": 4}));
    let (status, _) = api_request(&user_token(BUYER), req, configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn sellers_cannot_review_their_own_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Completed))));
    db.expect_insert_review().never();
    let req = TestRequest::post().uri("/api/reviews").set_json(json!({"orderId": 8, "rating": 5}));
    let (status, _) = api_request(&user_token(SELLER), req, configure(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn ratings_out_of_range_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Completed))));
    db.expect_insert_review().never();
    let req = TestRequest::post().uri("/api/reviews").set_json(json!({"orderId": 8, "rating": 6}));
    let (status, body) = api_request(&user_token(BUYER), req, configure(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Rating must be between 1 and 5"), "was: {body}");
}

#[actix_web::test]
async fn reviews_for_a_service() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_reviews_for_service().with(eq(5)).times(1).returning(|_| Ok(vec![review(1, 8, 5)]));
    let req = TestRequest::get().uri("/api/reviews?serviceId=5");
    let (status, body) = api_request(&user_token(SELLER), req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let reviews: Vec<Review> = serde_json::from_str(&body).unwrap();
    assert_eq!(reviews.len(), 1);
}

fn configure(db: MockMarketplace) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ReviewApi::new(db);
        cfg.app_data(web::Data::new(api))
            .service(CreateReviewRoute::<MockMarketplace>::new())
            .service(ReviewsRoute::<MockMarketplace>::new());
    }
}
