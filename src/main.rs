use revu::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    mailer::{LogMailer, MailerState},
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point for the application, responsible for
/// initializing all core components: Configuration, Logging, Database,
/// Mailer, and the HTTP Server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    // AppConfig::load() implements the fail-fast principle for missing Production secrets.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Prioritizes the RUST_LOG environment variable, falling back to
    // sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "revu=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON format output for ingestion by centralized log
            // aggregators. Essential for monitoring.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (Postgres)
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // Apply pending schema migrations before accepting traffic.
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Failed to run database migrations.");

    // Instantiate the Repository, wrapped in an Arc for thread-safe sharing.
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Mailer Initialization
    // Confirmation codes are delivered through the MailService abstraction;
    // LogMailer writes them to the structured log stream.
    let mailer = Arc::new(LogMailer::new(&config.from_email)) as MailerState;

    // 6. Unified State Assembly
    let app_state = AppState {
        repo,
        mailer,
        config: config.clone(),
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on {}", config.bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: /swagger-ui");

    // The long-running Axum server process.
    axum::serve(listener, app).await.unwrap();
}
