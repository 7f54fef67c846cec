use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use marketplace_engine::{events::EventProducers, traits::OutboxFilter, OutboxApi, RetryPolicy};
use mockall::predicate::eq;

use super::{
    helpers::{admin_token, api_request, user_token, BUYER},
    mocks::MockMarketplace,
};
use crate::routes::OutboxTasksRoute;

#[actix_web::test]
async fn users_cannot_inspect_the_outbox() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_tasks().never();
    let req = TestRequest::get().uri("/api/admin/outbox");
    let (status, body) = api_request(&user_token(BUYER), req, configure(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Insufficient Permissions"), "was: {body}");
}

#[actix_web::test]
async fn admins_see_pending_tasks_by_default() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_tasks().with(eq(OutboxFilter::Pending)).times(1).returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri("/api/admin/outbox");
    let (status, body) = api_request(&admin_token(), req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn admins_can_list_failed_tasks() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_tasks().with(eq(OutboxFilter::Failed)).times(1).returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri("/api/admin/outbox?status=failed");
    let (status, _) = api_request(&admin_token(), req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn unknown_outbox_filters_are_bad_requests() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_tasks().never();
    let req = TestRequest::get().uri("/api/admin/outbox?status=stuck");
    let (status, _) = api_request(&admin_token(), req, configure(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn configure(db: MockMarketplace) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OutboxApi::new(db, EventProducers::default(), RetryPolicy::default());
        cfg.app_data(web::Data::new(api)).service(OutboxTasksRoute::<MockMarketplace, EventProducers>::new());
    }
}
