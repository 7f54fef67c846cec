use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{Duration, TimeZone, Utc};
use log::debug;
use marketplace_engine::db_types::{Order, OrderStatusType, Role};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
};

pub const BUYER: i64 = 11;
pub const SELLER: i64 = 22;
pub const STRANGER: i64 = 33;
pub const ADMIN: i64 = 1;

// Signs test tokens. DO NOT re-use this key anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("endpoint-tests-only-signing-key")
}

pub fn issue_token(user_id: i64, role: Role, ttl: Duration) -> String {
    let claims = JwtClaims::new(user_id, role, ttl);
    TokenIssuer::new(&get_auth_config()).issue_token(&claims).expect("Failed to sign token")
}

pub fn user_token(user_id: i64) -> String {
    issue_token(user_id, Role::User, Duration::hours(1))
}

pub fn admin_token() -> String {
    issue_token(ADMIN, Role::Admin, Duration::hours(1))
}

/// Sends `req` to an app whose `/api` scope is set up by `configure` and guarded by the JWT middleware.
pub async fn api_request<F>(auth_token: &str, req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = if auth_token.is_empty() {
        req
    } else {
        req.insert_header(("Authorization", format!("Bearer {auth_token}")))
    };
    let app = App::new().service(
        web::scope("/api").wrap(JwtMiddlewareFactory::new(get_auth_config())).configure(configure),
    );
    let service = test::init_service(app).await;
    debug!("Making request");
    send(&service, req).await
}

/// Middleware errors surface as `Err` in test services, whereas a real server turns them into responses.
pub async fn send<S, B>(service: &S, req: TestRequest) -> (StatusCode, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match test::try_call_service(service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn order(id: i64, status: OrderStatusType) -> Order {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Order {
        id,
        service_id: 5,
        buyer_id: BUYER,
        seller_id: SELLER,
        status,
        amount: 150_000.into(),
        currency: "ARS".into(),
        payment_ref: None,
        chat_id: Some(id * 10),
        created_at,
        updated_at: created_at,
    }
}
