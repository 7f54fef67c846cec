use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use chrono::{TimeZone, Utc};
use marketplace_engine::{
    db_types::{OrderStatusType, Payment, PaymentMethod, PaymentStatus, ReconciledPayment},
    events::EventProducers,
    payment_objects::CheckoutConfig,
    traits::{GatewayPayment, ProviderError},
    PaymentApi,
};
use mkt_common::Secret;
use mockall::predicate::eq;

use super::{
    helpers::{order, send},
    mocks::{MockGateway, MockMarketplace},
};
use crate::{
    helpers::{calculate_hmac, signature_manifest},
    middleware::{HmacMiddlewareFactory, REQUEST_ID_HEADER, SIGNATURE_HEADER},
    routes::MercadopagoWebhookRoute,
};

const SECRET: &str = "webhook-tests-secret";
const REQUEST_ID: &str = "bb56a2f1-6aae-46ac-982e-9dcd3581d08e";
const TS: &str = "1704908010";

fn signature_for(data_id: Option<&str>) -> String {
    let manifest = signature_manifest(data_id, Some(REQUEST_ID), TS);
    format!("ts={TS},v1={}", calculate_hmac(SECRET, manifest.as_bytes()))
}

fn payment(status: PaymentStatus) -> Payment {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 0).unwrap();
    Payment {
        id: 70,
        order_id: 42,
        amount: 150_000.into(),
        currency: "ARS".into(),
        payment_method: PaymentMethod::MercadoPago,
        status,
        payment_intent_id: Some("pref-42".into()),
        transaction_id: None,
        description: None,
        created_at,
        updated_at: created_at,
    }
}

async fn post_webhook(
    db: MockMarketplace,
    gateway: MockGateway,
    req: TestRequest,
    checks_enabled: bool,
) -> (StatusCode, String) {
    let api = PaymentApi::new(db, gateway, CheckoutConfig::default(), EventProducers::default());
    let app = App::new().app_data(web::Data::new(api)).service(
        web::scope("/payments/mercadopago")
            .wrap(HmacMiddlewareFactory::new(Secret::new(SECRET.to_string()), checks_enabled))
            .service(MercadopagoWebhookRoute::<MockMarketplace, MockGateway>::new()),
    );
    let service = test::init_service(app).await;
    send(&service, req).await
}

fn notification(data_id: &str) -> TestRequest {
    TestRequest::post()
        .uri(&format!("/payments/mercadopago/webhook?data.id={data_id}&type=payment"))
        .insert_header((REQUEST_ID_HEADER, REQUEST_ID))
        .set_json(serde_json::json!({"action": "payment.updated", "type": "payment", "data": {"id": data_id}}))
}

#[actix_web::test]
async fn unsigned_notifications_are_forbidden() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    let (status, _) = post_webhook(MockMarketplace::new(), gateway, notification("1319496441"), true).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn mis_signed_notifications_are_forbidden() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    // Signed for a different payment
    let req = notification("1319496441").insert_header((SIGNATURE_HEADER, signature_for(Some("999"))));
    let (status, body) = post_webhook(MockMarketplace::new(), gateway, req, true).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Invalid webhook signature"), "was: {body}");
}

#[actix_web::test]
async fn notifications_with_disagreeing_ids_are_forbidden() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    // A valid signature for the query id, replayed with another payment in the body
    let req = TestRequest::post()
        .uri("/payments/mercadopago/webhook?data.id=1319496441&type=payment")
        .insert_header((REQUEST_ID_HEADER, REQUEST_ID))
        .insert_header((SIGNATURE_HEADER, signature_for(Some("1319496441"))))
        .set_json(serde_json::json!({"type": "payment", "data": {"id": "999"}}));
    let (status, body) = post_webhook(MockMarketplace::new(), gateway, req, true).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Notification ids do not match"), "was: {body}");
}

#[actix_web::test]
async fn the_query_id_is_the_one_fetched() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_payment()
        .with(eq("77"))
        .times(1)
        .returning(|_| Err(ProviderError::Unreachable("connection refused".into())));
    let req = TestRequest::post()
        .uri("/payments/mercadopago/webhook?data.id=77&type=payment")
        .set_json(serde_json::json!({"type": "payment", "data": {"id": "78"}}));
    let (status, body) = post_webhook(MockMarketplace::new(), gateway, req, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":false}"#);
}

#[actix_web::test]
async fn signed_merchant_order_notifications_are_ignored() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    let req = TestRequest::post()
        .uri("/payments/mercadopago/webhook")
        .insert_header((REQUEST_ID_HEADER, REQUEST_ID))
        .insert_header((SIGNATURE_HEADER, signature_for(Some("555"))))
        .set_json(serde_json::json!({"type": "merchant_order", "data": {"id": "555"}}));
    let (status, body) = post_webhook(MockMarketplace::new(), gateway, req, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true}"#);
}

#[actix_web::test]
async fn approved_payment_pays_for_the_order() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().with(eq("1319496441")).times(1).returning(|id| {
        Ok(GatewayPayment { id: id.to_string(), status: "approved".into(), external_reference: Some("42".into()) })
    });
    let mut db = MockMarketplace::new();
    db.expect_fetch_latest_payment()
        .with(eq(42), eq(PaymentMethod::MercadoPago))
        .times(1)
        .returning(|_, _| Ok(Some(payment(PaymentStatus::Pending))));
    db.expect_reconcile_payment()
        .withf(|u| {
            u.payment_id == 70 &&
                u.status == PaymentStatus::Completed &&
                u.transaction_id.as_deref() == Some("1319496441")
        })
        .times(1)
        .returning(|u| {
            let mut paid = order(42, OrderStatusType::Paid);
            paid.payment_ref = u.transaction_id.clone();
            Ok(ReconciledPayment {
                payment: payment(u.status),
                payment_changed: true,
                paid_order: Some(paid),
                annulled_order: None,
            })
        });
    let req = notification("1319496441").insert_header((SIGNATURE_HEADER, signature_for(Some("1319496441"))));
    let (status, body) = post_webhook(db, gateway, req, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true}"#);
}

#[actix_web::test]
async fn gateway_failures_are_acknowledged_with_ok_false() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().returning(|_| Err(ProviderError::Unreachable("connection refused".into())));
    let mut db = MockMarketplace::new();
    db.expect_reconcile_payment().never();
    let (status, body) = post_webhook(db, gateway, notification("77"), false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":false}"#);
}

#[actix_web::test]
async fn notifications_without_a_payment_id_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    let req = TestRequest::post().uri("/payments/mercadopago/webhook").set_json(serde_json::json!({"type": "payment"}));
    let (status, body) = post_webhook(MockMarketplace::new(), gateway, req, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true}"#);
}

#[actix_web::test]
async fn unknown_references_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().returning(|id| {
        Ok(GatewayPayment { id: id.to_string(), status: "approved".into(), external_reference: Some("abc".into()) })
    });
    let mut db = MockMarketplace::new();
    db.expect_fetch_latest_payment().never();
    let (status, body) = post_webhook(db, gateway, notification("88"), false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true}"#);
}
