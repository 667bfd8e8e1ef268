//! Authorization gate.
//!
//! A bearer JWT on the request resolves to an [`Identity`]. Handlers receive
//! a [`Caller`] (possibly anonymous) or an [`Admin`] witness. Every gate
//! failure is `403 Forbidden`, with or without a session.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Role;
use crate::error::{Result, ShopError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn user(user_id: impl Into<String>) -> Self { Self { user_id: user_id.into(), role: Role::User } }
    pub fn admin(user_id: impl Into<String>) -> Self { Self { user_id: user_id.into(), role: Role::Admin } }
}

/// The resolved caller of a request.
#[derive(Clone, Debug, Default)]
pub struct Caller(Option<Identity>);

/// Proof that the caller passed the ADMIN gate. Only [`Caller::require_admin`]
/// constructs it.
#[derive(Clone, Debug)]
pub struct Admin(Identity);

impl Admin {
    pub fn id(&self) -> &str { &self.0.user_id }
}

impl Caller {
    pub fn anonymous() -> Self { Self(None) }

    pub fn authenticated(identity: Identity) -> Self { Self(Some(identity)) }

    pub fn identity(&self) -> Option<&Identity> { self.0.as_ref() }

    pub fn is_role(&self, role: Role) -> bool { self.0.as_ref().is_some_and(|i| i.role == role) }

    pub fn require_identity(&self) -> Result<&Identity> {
        self.0.as_ref().ok_or_else(|| ShopError::Forbidden("Sign-in required".into()))
    }

    pub fn require_role(&self, role: Role) -> Result<&Identity> {
        match &self.0 {
            Some(identity) if identity.role == role => Ok(identity),
            _ => Err(ShopError::Forbidden(format!("{role} role required"))),
        }
    }

    pub fn require_admin(&self) -> Result<Admin> {
        self.require_role(Role::Admin).cloned().map(Admin)
    }

    /// Passes when the caller owns the resource or holds `role`.
    pub fn require_self_or_role(&self, owner_id: &str, role: Role) -> Result<&Identity> {
        match &self.0 {
            Some(identity) if identity.user_id == owner_id || identity.role == role => Ok(identity),
            _ => Err(ShopError::Forbidden("Not allowed to access this resource".into())),
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().cloned()))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Admin {
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Caller(parts.extensions.get::<Identity>().cloned()).require_admin()
    }
}

/// Header carrying the payment callback secret.
pub const CALLBACK_SECRET_HEADER: &str = "x-callback-secret";

/// Shared secret between the payment bridge and this service.
#[derive(Clone)]
pub struct CallbackSecret(Arc<str>);

impl CallbackSecret {
    pub fn new(secret: &str) -> Self { Self(Arc::from(secret)) }

    pub fn verify(&self, presented: Option<&str>) -> Result<SignedCallback> {
        match presented {
            Some(p) if !p.is_empty() && constant_time_compare(&self.0, p) => Ok(SignedCallback(())),
            _ => Err(ShopError::Forbidden("Invalid payment callback signature".into())),
        }
    }
}

/// Proof that a settlement callback carried the shared secret. Only
/// [`CallbackSecret::verify`] constructs it.
#[derive(Debug)]
pub struct SignedCallback(());

#[async_trait]
impl<S> FromRequestParts<S> for SignedCallback
where
    S: Send + Sync,
    CallbackSecret: FromRef<S>,
{
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let presented = parts.headers.get(CALLBACK_SECRET_HEADER).and_then(|v| v.to_str().ok());
        CallbackSecret::from_ref(state).verify(presented)
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

/// HS256 token issuing and verification.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }

    pub fn create_token(&self, identity: &Identity, ttl: Duration) -> jsonwebtoken::errors::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.user_id.clone(),
            role: identity.role,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Returns `None` for malformed, expired or foreign tokens.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .ok()
            .map(|data| Identity { user_id: data.claims.sub, role: data.claims.role })
    }
}

/// Resolves the bearer token, if any, and stores the [`Identity`] in the
/// request extensions. Requests without a valid token continue anonymously.
pub async fn authenticate(State(jwt): State<Arc<JwtService>>, mut request: Request, next: Next) -> Response {
    let identity = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v))
        .and_then(|token| jwt.verify(token));

    match identity {
        Some(identity) => {
            tracing::debug!(user_id = %identity.user_id, role = %identity.role, "Authenticated request");
            request.extensions_mut().insert(identity);
        }
        None => tracing::debug!("Anonymous request"),
    }
    next.run(request).await
}
