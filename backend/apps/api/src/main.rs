//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use anyhow::Context;
use axum::{
    Router, http,
    http::{HeaderName, Method, header},
};
use mentor::domain::ports::{FileStorage, NotificationDispatcher};
use mentor::infra::collaborators::{LocalFileStorage, TracingNotifier};
use mentor::{MentorConfig, MentorPlatform, PgMentorRepository, PlatformServices, mentor_router};
use platform::clock::{Clock, SystemClock};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// Interval between cache / rate-limit purges and audit fallback flushes
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,mentor=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url =
        env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Mentor configuration
    let mentor_config = if cfg!(debug_assertions) {
        MentorConfig::development()
    } else {
        MentorConfig::from_env()
    };
    tracing::info!(
        store_timeout_ms = mentor_config.store_timeout_ms(),
        max_document_bytes = mentor_config.max_document_bytes,
        "Mentor configuration loaded"
    );

    // Collaborators
    let file_root = env::var("MENTOR_FILE_ROOT").unwrap_or_else(|_| "./uploads".to_string());
    let file_base_url = env::var("MENTOR_FILE_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:31113/files".to_string());
    tokio::fs::create_dir_all(&file_root)
        .await
        .with_context(|| format!("MENTOR_FILE_ROOT {file_root} is not writable"))?;
    tracing::info!(root = %file_root, base_url = %file_base_url, "File storage ready");
    let storage = LocalFileStorage::new(&file_root, file_base_url);
    let uploads = ServeDir::new(storage.root());
    let files: Arc<dyn FileStorage> = Arc::new(storage);
    let notifier: Arc<dyn NotificationDispatcher> = Arc::new(TracingNotifier);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let services = PlatformServices::new(clock, &mentor_config);
    let platform = Arc::new(MentorPlatform::new(
        Arc::new(PgMentorRepository::new(pool.clone())),
        notifier,
        files,
        services,
        mentor_config,
    ));

    // Housekeeping: errors here never stop the server
    let housekeeping = platform.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(HOUSEKEEPING_INTERVAL);
        loop {
            ticker.tick().await;
            let (cache_entries, rate_windows) = housekeeping.purge_expired();
            let flushed = housekeeping.flush_audit_fallback().await;
            if cache_entries + rate_windows + flushed > 0 {
                tracing::info!(
                    cache_entries,
                    rate_windows,
                    audit_flushed = flushed,
                    "Housekeeping completed"
                );
            }
        }
    });

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(mentor::presentation::middleware::ACTOR_HEADER),
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/mentor", mentor_router(platform))
        .nest_service("/files", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:31113".to_string())
        .parse()
        .context("BIND_ADDR must be a socket address")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
