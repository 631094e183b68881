mod api;
mod auth;
mod config;
mod db;
mod error;
mod middleware;
mod models;
mod response;
mod schema;
mod seeding;
mod services;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppError;
use crate::middleware::rate_limit::{rate_limit, RateLimiter};
use crate::services::generation::client::GeneratorClient;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub generator: Arc<GeneratorClient>,
    pub global_limiter: Arc<RateLimiter>,
    pub auth_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Result<Self> {
        let generator = GeneratorClient::new(&config.generator)?;
        let window = Duration::from_secs(config.rate_limit.window_secs);
        // Limits only apply in production.
        let enforce = config.server.environment.is_production();

        Ok(Self {
            db,
            generator: Arc::new(generator),
            global_limiter: Arc::new(RateLimiter::new(
                "global",
                config.rate_limit.max_requests,
                window,
                enforce,
            )),
            auth_limiter: Arc::new(RateLimiter::new(
                "auth",
                config.rate_limit.auth_max_requests,
                window,
                enforce,
            )),
            config: Arc::new(config),
        })
    }
}

use clap::Parser;

#[derive(Parser)]
#[command(version, author = "TIMETABLE AUTHORS", about = "Timetable Server\nLicensed under AGPLv3", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Generate a default configuration template to stdout
    #[arg(long)]
    generate_config: bool,
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Hello World!" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Full application router. Layers listed last wrap outermost.
pub fn build_app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api::routes(state.clone()))
        .fallback(not_found)
        .layer(from_fn_with_state(state.global_limiter.clone(), rate_limit))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(from_fn(middleware::request_id))
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&config.server.cors_origins))
        .layer(from_fn(middleware::security_headers))
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", Config::default_template());
        return Ok(());
    }

    dotenvy::dotenv().ok();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| "server-config.toml".to_string());

    if cli.config.is_some() && std::fs::metadata(&config_path).is_err() {
        eprintln!("Error: Configuration file '{}' not found.", config_path);
        eprintln!("Run with --generate-config to see a template.");
        std::process::exit(1);
    }

    let config = match Config::resolve(Some(config_path.as_str())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "timetable_server={level},tower_http={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting in {} mode (generator at {})",
        config.server.environment,
        config.generator.url
    );

    let db_pool = db::create_pool(&config.database.url, config.database.pool_size)?;
    db::run_migrations(&mut db_pool.get()?)?;
    seeding::seed_defaults(&db_pool)?;
    tracing::info!("Database initialized and seeded");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(db_pool, config)?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root_health_and_json_404() {
        let (pool, _dir) = db::test_pool();
        let app = build_app(AppState::new(pool, Config::default()).unwrap());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert!(response.headers().contains_key("x-request-id"));

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Route not found");
    }

    #[test]
    fn test_panic_response_is_generic_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
