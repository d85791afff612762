//! Shared fixtures for the HTTP integration tests.
//!
//! The app runs against `MemoryStore` and `MemoryPageCache`; actors are
//! authenticated with HS256 bearer tokens signed by `SECRET`.
#![allow(dead_code)]

use actix_web::http::header;
use blog_service::cache::{MemoryPageCache, PageCacheService};
use blog_service::db::{MemoryStore, PostRepository, Repositories};
use blog_service::middleware::{Claims, TokenVerifier};
use blog_service::models::{Group, Identity, NewPost};
use blog_service::AppState;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;
use std::time::Duration;

pub const SECRET: &str = "integration-test-secret";
pub const LOGIN_URL: &str = "/auth/login/";
pub const TRUSTED_ORIGIN: &str = "http://localhost:8080";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryPageCache>,
    pub state: AppState,
    pub verifier: Arc<TokenVerifier>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryPageCache::new());
        let state = AppState::new(
            Repositories::memory(store.clone()),
            PageCacheService::new(cache.clone(), Duration::from_secs(20)),
            LOGIN_URL,
        );
        Self {
            store,
            cache,
            state,
            verifier: Arc::new(TokenVerifier::hs256(SECRET)),
        }
    }

    pub async fn user(&self, username: &str) -> Identity {
        self.store.add_user(username).await
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.store
            .add_group(slug, "Тестовая группа", "Тестовое описание")
            .await
    }

    /// Insert `n` posts by `author`, optionally filed under `group`.
    pub async fn posts(&self, author: &Identity, group: Option<&Group>, n: usize) {
        let posts = (0..n)
            .map(|i| NewPost {
                author_id: author.id,
                text: format!("Тестовый пост {}", i),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .collect();
        self.store.bulk_create(posts).await.unwrap();
    }
}

/// `Authorization` header for `identity`.
pub fn bearer(identity: &Identity) -> (header::HeaderName, String) {
    let claims = Claims {
        sub: identity.id.to_string(),
        username: identity.username.clone(),
        exp: Utc::now().timestamp() + 3600,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Build the route table exactly as `main` does, minus PostgreSQL and CORS.
macro_rules! init_app {
    ($harness:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($harness.state.clone()))
                .wrap(blog_service::middleware::CsrfMiddleware::new(vec![
                    common::TRUSTED_ORIGIN.to_string(),
                ]))
                .wrap(blog_service::middleware::IdentityMiddleware::new(Some(
                    $harness.verifier.clone(),
                )))
                .configure(blog_service::handlers::configure)
                .default_service(actix_web::web::to(blog_service::handlers::not_found)),
        )
        .await
    };
}
