//! Caller identity.
//!
//! Access tokens are HS256 JWTs issued by the identity service, which shares [`AuthConfig::jwt_secret`] with this
//! server. The [`crate::middleware::JwtMiddlewareFactory`] validates the token on every `/api` request and stores the
//! [`JwtClaims`] in the request extensions, from where handlers extract them.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use marketplace_engine::{db_types::Role, policy::Actor};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: i64,
    pub role: Role,
    /// Expiry, in seconds since the Unix epoch
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(user_id: i64, role: Role, ttl: Duration) -> Self {
        Self { sub: user_id, role, exp: (Utc::now() + ttl).timestamp() }
    }

    pub fn actor(&self) -> Actor {
        Actor { user_id: self.sub, role: self.role }
    }

    /// Admins hold every role.
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role || self.role == Role::Admin
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or(ServerError::from(AuthError::MissingToken));
        ready(claims)
    }
}

pub fn validate_token(token: &str, config: &AuthConfig) -> Result<JwtClaims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
    let data = decode::<JwtClaims>(token, &key, &Validation::new(Algorithm::HS256)).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::ValidationError("token has expired".into()),
        ErrorKind::InvalidSignature => AuthError::ValidationError("signature has failed verification".into()),
        ErrorKind::InvalidAlgorithm => AuthError::ValidationError("unexpected signing algorithm".into()),
        _ => AuthError::PoorlyFormattedToken(e.to_string()),
    })?;
    debug!("🔐️ Access token validated for user {} ({})", data.claims.sub, data.claims.role);
    Ok(data.claims)
}

/// Reads the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    (scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty()).then(|| token.trim())
}

/// Signs access tokens. Production tokens come from the identity service; this is used by tooling and tests.
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn issue_token(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.key).map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}
