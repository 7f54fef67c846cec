use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Duration;
use marketplace_engine::{
    db_types::{Order, OrderStatusType, Role},
    events::EventProducers,
    OrderFlowApi,
};
use mockall::predicate::eq;

use super::{
    helpers::{admin_token, api_request, issue_token, order, user_token, BUYER, SELLER, STRANGER},
    mocks::MockMarketplace,
};
use crate::routes::{DeleteOrderRoute, MyOrdersRoute, OrderByIdRoute, StartWorkRoute};

#[actix_web::test]
async fn fetch_my_orders_without_a_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = api_request("", TestRequest::get().uri("/api/orders"), configure(MockMarketplace::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No access token was provided."}"#);
}

#[actix_web::test]
async fn fetch_my_orders_with_an_expired_token() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BUYER, Role::User, Duration::hours(-2));
    let req = TestRequest::get().uri("/api/orders");
    let (status, body) = api_request(&token, req, configure(MockMarketplace::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("token has expired"), "was: {body}");
}

#[actix_web::test]
async fn fetch_my_orders_with_a_tampered_token() {
    let _ = env_logger::try_init().ok();
    let mut token = user_token(BUYER);
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    let req = TestRequest::get().uri("/api/orders");
    let (status, _) = api_request(&token, req, configure(MockMarketplace::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_orders_for_user()
        .with(eq(Some(BUYER)))
        .times(1)
        .returning(|_| Ok(vec![order(2, OrderStatusType::Paid), order(1, OrderStatusType::Canceled)]));
    let req = TestRequest::get().uri("/api/orders");
    let (status, body) = api_request(&user_token(BUYER), req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<Order> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, 2);
    assert_eq!(orders[0].status, OrderStatusType::Paid);
    assert!(body.contains(r#""amount":150000"#), "was: {body}");
    assert!(body.contains(r#""buyerId":11"#), "was: {body}");
}

#[actix_web::test]
async fn admins_see_every_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_orders_for_user().with(eq(None)).times(1).returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri("/api/orders");
    let (status, body) = api_request(&admin_token(), req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn orders_are_hidden_from_strangers() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_order().with(eq(7)).returning(|id| Ok(Some(order(id, OrderStatusType::Paid))));
    let req = TestRequest::get().uri("/api/orders/7");
    let (status, body) = api_request(&user_token(STRANGER), req, configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("7"), "was: {body}");
}

#[actix_web::test]
async fn missing_orders_are_not_found() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_order().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/api/orders/99");
    let (status, _) = api_request(&user_token(BUYER), req, configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn seller_starts_work_on_a_paid_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Paid))));
    db.expect_transition_order()
        .with(eq(3), eq(OrderStatusType::Paid), eq(OrderStatusType::InProgress))
        .times(1)
        .returning(|id, _, to| Ok(order(id, to)));
    let req = TestRequest::patch().uri("/api/orders/3/start");
    let (status, body) = api_request(&user_token(SELLER), req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.status, OrderStatusType::InProgress);
}

#[actix_web::test]
async fn paid_orders_cannot_be_deleted_even_by_admins() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Paid))));
    db.expect_delete_order().never();
    let req = TestRequest::delete().uri("/api/orders/4");
    let (status, _) = api_request(&admin_token(), req, configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn buyer_deletes_an_unpaid_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketplace::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::PendingPayment))));
    db.expect_delete_order()
        .with(eq(5), eq(OrderStatusType::PendingPayment))
        .times(1)
        .returning(|id, status| Ok(order(id, status)));
    let req = TestRequest::delete().uri("/api/orders/5");
    let (status, body) = api_request(&user_token(BUYER), req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Order 5 deleted"}"#);
}

fn configure(db: MockMarketplace) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(db, EventProducers::default());
        cfg.app_data(web::Data::new(api))
            .service(MyOrdersRoute::<MockMarketplace>::new())
            .service(OrderByIdRoute::<MockMarketplace>::new())
            .service(StartWorkRoute::<MockMarketplace>::new())
            .service(DeleteOrderRoute::<MockMarketplace>::new());
    }
}
