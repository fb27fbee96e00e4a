use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use board_service::db::{ActivityStore, PgActivityStore};
use board_service::handlers;
use board_service::middleware::{MetricsMiddleware, ViewerIdentity};
use board_service::pagination::PageSizePolicy;
use board_service::services::ActivityService;
use board_service::Config;
use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "board-service";

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,board_service=debug,sqlx=warn".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

/// Board Service
///
/// # Routes
///
/// - `/api/v1/boards/{board_id}/activity` - board activity feed
/// - `/api/v1/threads/{thread_id}/activity` - thread activity feed
/// - `/api/v1/subscriptions/{subscription_id}/activity` - subscription activity feed
/// - `/api/v1/health`, `/api/v1/health/ready`, `/api/v1/health/live`
/// - `/metrics` - Prometheus metrics
#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    tracing::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_cfg = DbPoolConfig {
        service_name: SERVICE_NAME.to_string(),
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        acquire_timeout_secs: config.database.acquire_timeout_secs,
        ..DbPoolConfig::default()
    };
    db_cfg.log_config();

    let db_pool = create_pg_pool(db_cfg)
        .await
        .context("Failed to create database pool")?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run migrations")?;
        tracing::info!("Migrations completed successfully");
    }

    let store: Arc<dyn ActivityStore> = Arc::new(PgActivityStore::new(db_pool.clone()));
    tracing::info!(
        "Activity store precision: {} fractional digits",
        store.precision().fractional_digits()
    );

    let activity_service = web::Data::new(ActivityService::new(
        store,
        PageSizePolicy::from(&config.pagination),
    ));
    let pool_data = web::Data::new(db_pool);
    let allowed_origins = config.cors.allowed_origins.clone();

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allowed_methods(vec!["GET"]).allow_any_header().max_age(3600);

        App::new()
            .app_data(pool_data.clone())
            .app_data(activity_service.clone())
            .wrap(MetricsMiddleware)
            .wrap(ViewerIdentity)
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(board_service::metrics::serve_metrics),
            )
            // Health routes go before the /api/v1 scope registered by configure.
            .route("/api/v1/health", web::get().to(handlers::health_summary))
            .route("/api/v1/health/ready", web::get().to(handlers::readiness_check))
            .route("/api/v1/health/live", web::get().to(handlers::liveness_check))
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .shutdown_timeout(30)
    .run()
    .await
    .context("HTTP server failed")?;

    tracing::info!("{} shut down", SERVICE_NAME);
    Ok(())
}
