use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use swot_portal::{
    AppState, CaptchaService, SessionStore, SubmissionStore, create_router,
    config::{AppConfig, Env},
    storage::{DatabaseBackend, FileBackend, StorageState},
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point for the application, responsible for
/// initializing all core components: Configuration, Logging, Storage backend,
/// Store hydration, and the HTTP Server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    // AppConfig::load() implements the fail-fast principle for missing Production secrets.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Prioritizes the RUST_LOG environment variable, falling back to sensible
    // defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "swot_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    // The structured logging format is dynamically selected based on APP_ENV.
    match config.env {
        Env::Local => {
            // LOCAL: pretty output for human readability during debugging.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON output for ingestion by centralized log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Storage Backend Selection (static startup decision)
    // The database backend is preferred whenever DATABASE_URL is configured and
    // the pool connects; anything else falls back to the local JSON file. There
    // is no backend switching after this point.
    let backend: StorageState = match &config.database_url {
        Some(url) => match SqlitePoolOptions::new().max_connections(5).connect(url).await {
            Ok(pool) => {
                tracing::info!("Storage: database (persistent) - submissions survive restarts");
                Arc::new(DatabaseBackend::new(pool))
            }
            Err(e) => {
                tracing::warn!(
                    "Database connection failed, falling back to file storage: {e}"
                );
                Arc::new(FileBackend::new(config.submissions_file()))
            }
        },
        None => {
            tracing::warn!(
                "DATABASE_URL not set - using JSON file at {} (data is lost on restart on ephemeral hosts)",
                config.submissions_file().display()
            );
            Arc::new(FileBackend::new(config.submissions_file()))
        }
    };

    // 5. Store Hydration
    // A failed load degrades to an empty store rather than aborting startup.
    let store = SubmissionStore::new(backend);
    store.load().await;

    if config.openai_api_key.is_some() {
        tracing::info!("OpenAI API key loaded. AI analysis enabled.");
    } else {
        tracing::warn!("OPENAI_API_KEY not set. AI analysis disabled (503).");
    }

    // 6. Unified State Assembly
    let app_state = AppState {
        store,
        sessions: SessionStore::new(),
        captcha: CaptchaService::new(config.captcha_secret.clone()),
        config: config.clone(),
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: failed to bind {addr}: {e}"));

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on {addr}");
    tracing::info!(
        "API Documentation (Swagger UI) available at: http://localhost:{}/swagger-ui",
        config.port
    );

    // The long-running Axum server process.
    axum::serve(listener, app)
        .await
        .expect("FATAL: server exited with an error");
}
