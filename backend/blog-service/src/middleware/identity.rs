use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

use crate::config::AuthConfig;
use crate::models::Identity;

/// Claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (integer user id as string)
    pub sub: String,
    pub username: String,
    pub exp: i64,
}

/// The caller of the current request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Actor {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl Actor {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(identity) => Some(identity),
        }
    }
}

/// Verifies bearer tokens signed by the identity provider.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn rs256(public_key_pem: &str) -> anyhow::Result<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to parse RSA public key: {e}"))?;
        Ok(Self::with_key(decoding_key, Algorithm::RS256))
    }

    pub fn hs256(secret: &str) -> Self {
        Self::with_key(DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
    }

    fn with_key(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        Self {
            decoding_key,
            validation,
        }
    }

    /// Build from configuration; `None` when no key is configured, in which
    /// case every request is anonymous.
    pub fn from_config(config: &AuthConfig) -> anyhow::Result<Option<Self>> {
        if let Some(pem) = config.jwt_public_key_pem.as_deref() {
            return Self::rs256(pem).map(Some);
        }
        Ok(config.jwt_secret.as_deref().map(Self::hs256))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| jsonwebtoken::errors::ErrorKind::InvalidSubject)?;
        Ok(Identity {
            id,
            username: data.claims.username,
        })
    }

    fn actor_for(&self, req: &ServiceRequest) -> Actor {
        let Some(token) = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        else {
            return Actor::Anonymous;
        };

        match self.verify(token.trim()) {
            Ok(identity) => Actor::Authenticated(identity),
            Err(e) => {
                debug!("Bearer token rejected: {}", e);
                Actor::Anonymous
            }
        }
    }
}

/// Resolves the request's `Actor`. Never rejects a request: a missing or
/// invalid token yields `Actor::Anonymous`.
#[derive(Clone, Default)]
pub struct IdentityMiddleware {
    verifier: Option<Arc<TokenVerifier>>,
}

impl IdentityMiddleware {
    pub fn new(verifier: Option<Arc<TokenVerifier>>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = IdentityMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
    verifier: Option<Arc<TokenVerifier>>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let actor = match &self.verifier {
            Some(verifier) => verifier.actor_for(&req),
            None => Actor::Anonymous,
        };
        req.extensions_mut().insert(actor);

        Box::pin(async move { service.call(req).await })
    }
}

impl FromRequest for Actor {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let actor = req.extensions().get::<Actor>().cloned().unwrap_or_default();
        ready(Ok(actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(sub: &str, exp: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            username: "auth".to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_identity() {
        let verifier = TokenVerifier::hs256(SECRET);
        let exp = Utc::now().timestamp() + 3600;
        let identity = verifier.verify(&token("42", exp)).unwrap();
        assert_eq!(identity, Identity { id: 42, username: "auth".into() });
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = TokenVerifier::hs256(SECRET);
        let exp = Utc::now().timestamp() - 3600;
        assert!(verifier.verify(&token("42", exp)).is_err());
    }

    #[test]
    fn non_numeric_subject_is_rejected() {
        let verifier = TokenVerifier::hs256(SECRET);
        let exp = Utc::now().timestamp() + 3600;
        assert!(verifier.verify(&token("not-a-number", exp)).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let verifier = TokenVerifier::hs256("another-secret");
        let exp = Utc::now().timestamp() + 3600;
        assert!(verifier.verify(&token("42", exp)).is_err());
    }
}
