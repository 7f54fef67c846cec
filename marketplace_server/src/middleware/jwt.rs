//! Access token middleware.
//!
//! Wrap the authenticated scope with [`JwtMiddlewareFactory`]. Requests without a valid `Authorization: Bearer` token
//! are rejected with 401 before reaching any handler. Valid claims are stored in the request extensions.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace};

use crate::{
    auth::{bearer_token, validate_token},
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    config: AuthConfig,
}

impl JwtMiddlewareFactory {
    pub fn new(config: AuthConfig) -> Self {
        JwtMiddlewareFactory { config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareService { config: self.config.clone(), service: Rc::new(service) }))
    }
}

pub struct JwtMiddlewareService<S> {
    config: AuthConfig,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let config = self.config.clone();
        Box::pin(async move {
            trace!("🔐️ Checking access token for {}", req.path());
            let header = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()).ok_or_else(|| {
                debug!("🔐️ No access token in request to {}", req.path());
                ServerError::from(AuthError::MissingToken)
            })?;
            let token = bearer_token(header).ok_or_else(|| {
                ServerError::from(AuthError::PoorlyFormattedToken("Expected a Bearer token".into()))
            })?;
            let claims = validate_token(token, &config).map_err(|e| {
                debug!("🔐️ Rejecting access token. {e}");
                ServerError::from(e)
            })?;
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
