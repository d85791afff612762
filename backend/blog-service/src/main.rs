use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use blog_service::cache::{MemoryPageCache, PageCache, PageCacheService, RedisPageCache};
use blog_service::db::{create_pool, Repositories};
use blog_service::handlers;
use blog_service::middleware::{CsrfMiddleware, IdentityMiddleware, TokenVerifier};
use blog_service::{AppState, Config};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    db_pool: sqlx::PgPool,
    page_cache: Arc<dyn PageCache>,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }
}

fn component_check(name: &str, result: Result<(), String>, started: Instant) -> ComponentCheck {
    let latency_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: format!("{} check successful", name),
            latency_ms,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("{} check failed: {}", name, e),
            latency_ms,
        },
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "blog-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_check(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let started = Instant::now();
    let pg = state.check_postgres().await.map_err(|e| e.to_string());
    checks.insert(
        "postgresql".to_string(),
        component_check("PostgreSQL", pg, started),
    );

    let started = Instant::now();
    let cache = state.page_cache.ping().await.map_err(|e| e.to_string());
    checks.insert(
        "page_cache".to_string(),
        component_check("Page cache", cache, started),
    );

    let ready = checks
        .values()
        .all(|c| matches!(c.status, ComponentStatus::Healthy));
    let response = ReadinessResponse {
        ready,
        status: if ready {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        },
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn to_io_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Container healthcheck: `blog-service healthcheck`
    {
        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "healthcheck" {
                let port = std::env::var("BLOG_SERVICE_PORT").unwrap_or_else(|_| "8080".into());
                let url = format!("http://127.0.0.1:{}/health", port);
                match reqwest::Client::new().get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => return Ok(()),
                    Ok(resp) => {
                        eprintln!("healthcheck HTTP status: {}", resp.status());
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"));
                    }
                    Err(e) => {
                        eprintln!("healthcheck HTTP error: {}", e);
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"));
                    }
                }
            }
        }
    }

    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let verifier = TokenVerifier::from_config(&config.auth)
        .map_err(|e| to_io_error("Failed to initialize JWT verification", e))?
        .map(Arc::new);
    if verifier.is_none() {
        tracing::warn!("No JWT key configured; every request is treated as anonymous");
    }

    let db_pool = create_pool(&config.database)
        .await
        .map_err(|e| to_io_error("Failed to create database pool", e))?;
    tracing::info!("Connected to database");

    let page_cache: Arc<dyn PageCache> = match config.cache.redis_url.as_deref() {
        Some(url) => {
            let cache = RedisPageCache::connect(url)
                .await
                .map_err(|e| to_io_error("Failed to initialize Redis connection", e))?;
            tracing::info!("Page cache: redis");
            Arc::new(cache)
        }
        None => {
            tracing::info!("Page cache: in-process");
            Arc::new(MemoryPageCache::new())
        }
    };

    let cache_service = PageCacheService::new(
        page_cache.clone(),
        Duration::from_secs(config.cache.index_page_ttl_secs),
    );
    let app_state = web::Data::new(AppState::new(
        Repositories::postgres(db_pool.clone()),
        cache_service,
        &config.auth.login_url,
    ));
    let health_state = web::Data::new(HealthState {
        db_pool,
        page_cache,
    });

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let trusted_origins = config.csrf.trusted_origins.clone();
    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &trusted_origins {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .app_data(health_state.clone())
            .wrap(CsrfMiddleware::new(trusted_origins.clone()))
            .wrap(IdentityMiddleware::new(verifier.clone()))
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(blog_service::metrics::serve_metrics))
            .route("/health", web::get().to(liveness_check))
            .route("/health/ready", web::get().to(readiness_check))
            .configure(handlers::configure)
            .default_service(web::to(handlers::not_found))
    })
    .bind(&bind_address)?
    .run()
    .await
}
