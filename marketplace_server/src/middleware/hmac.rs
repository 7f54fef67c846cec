//! Webhook signature middleware.
//!
//! Mercado Pago signs every notification with the webhook secret. The `x-signature` header carries a timestamp and a
//! hex HMAC-SHA256 over a manifest built from the notification's `data.id`, the `x-request-id` header and that
//! timestamp (see [`signature_manifest`]). `data.id` is read from the query string, falling back to the JSON body.
//! When both carry an id they must agree, otherwise the request is refused.
//!
//! Wrap the webhook route with this middleware. Unsigned or mis-signed requests get a 403 response.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use mkt_common::Secret;
use serde_json::Value;

use crate::{
    errors::{AuthError, ServerError},
    helpers::{signature_manifest, verify_hmac, WebhookSignature},
};

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct HmacMiddlewareFactory {
    key: Secret<String>,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl HmacMiddlewareFactory {
    pub fn new(key: Secret<String>, enabled: bool) -> Self {
        HmacMiddlewareFactory { key, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService { key: self.key.clone(), enabled: self.enabled, service: Rc::new(service) }))
    }
}

pub struct HmacMiddlewareService<S> {
    key: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.key.reveal().clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature for request");
            if !enabled {
                trace!("🔐️ Webhook signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let signature = req
                .headers()
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(WebhookSignature::parse)
                .ok_or_else(|| {
                    warn!("🔐️ No valid webhook signature found in request. Denying access.");
                    ServerError::from(AuthError::InvalidSignature("No webhook signature found.".into()))
                })?;
            let request_id = req.headers().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()).map(String::from);
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {e:?}");
                ServerError::InvalidRequestBody("Failed to extract request data.".into())
            })?;
            let query_id = data_id_from_query(req.query_string());
            let body_id = data_id_from_body(&data);
            if let (Some(q), Some(b)) = (&query_id, &body_id) {
                if q != b {
                    warn!("🔐️ Notification ids disagree (query {q}, body {b}). Denying access.");
                    return Err(
                        ServerError::from(AuthError::InvalidSignature("Notification ids do not match.".into())).into()
                    );
                }
            }
            let data_id = query_id.or(body_id);
            let manifest = signature_manifest(data_id.as_deref(), request_id.as_deref(), &signature.ts);
            if verify_hmac(&secret, manifest.as_bytes(), &signature.v1) {
                trace!("🔐️ Webhook signature check for request ✅️");
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid webhook signature found in request. Denying access.");
                Err(ServerError::from(AuthError::InvalidSignature("Invalid webhook signature.".into())).into())
            }
        })
    }
}

fn data_id_from_query(query: &str) -> Option<String> {
    web::Query::<Vec<(String, String)>>::from_query(query)
        .ok()
        .and_then(|q| q.into_inner().into_iter().find(|(k, _)| k == "data.id").map(|(_, v)| v))
}

fn data_id_from_body(body: &[u8]) -> Option<String> {
    let value = serde_json::from_slice::<Value>(body).ok()?;
    match &value["data"]["id"] {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
