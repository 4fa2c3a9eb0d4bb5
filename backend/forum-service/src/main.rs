use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use crypto_core::jwt::JwtKeys;
use db_pool::{create_pool, DbConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forum_service::config::StoreBackend;
use forum_service::handlers::health::not_found;
use forum_service::store::{ForumStore, MemoryStore, PgForumStore};
use forum_service::{routes, AppState, Config};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
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

/// Build the configured store, running migrations for PostgreSQL
async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn ForumStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let db_cfg = DbConfig::from_env(
                "forum-service",
                &config.store.database_url,
                config.store.max_connections,
            );
            db_cfg.log_config();

            let pool = create_pool(db_cfg)
                .await
                .context("Failed to create database pool")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            Ok(Arc::new(PgForumStore::new(pool)))
        }
    }
}

/// Forum Service
///
/// REST API for posts, threaded comments, likes and attachments.
///
/// # Routes
///
/// - `/api/auth/*` - Registration, login, profile
/// - `/api/posts/*` - Create, list, read, update, delete, like posts
/// - `/api/comments/*` - Create, list, delete, like comments
/// - `/api/files/*` - Download and delete attachments
/// - `/health`, `/metrics`
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting forum-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let jwt = JwtKeys::from_secret(&config.auth.jwt_secret, config.auth.jwt_expiry_days)
        .context("Failed to initialize JWT keys")?;

    tokio::fs::create_dir_all(&config.uploads.dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", config.uploads.dir.display()))?;

    let store = build_store(&config).await?;
    let state = web::Data::new(AppState::new(store, jwt, config.uploads.clone()));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(routes::configure)
            .default_service(web::to(not_found))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping server");
        handle.stop(true).await;
    });

    server.await.context("HTTP server error")?;
    tracing::info!("forum-service stopped");
    Ok(())
}
