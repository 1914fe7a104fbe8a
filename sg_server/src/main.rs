//! Session and shift admission control server.
//!
//! Serves the `/api/v1` surface over PostgreSQL-backed `shift_gate` services.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use pico_args::Arguments;
use sg_server::{
    api::{self, middleware::CookieSettings},
    config::ServerConfig,
    logging, metrics,
};
use shift_gate::{AccessServices, ServiceSettings, clock::SystemClock, db::Database};
use tracing::{info, warn};

const HELP: &str = "\
Run the shift gate admission control server

USAGE:
  sg_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               Owner session signing secret (required, 32+ chars)
  PASSWORD_PEPPER          Password and PIN hashing pepper (required, 16+ chars)
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs
        .opt_value_from_str("--bind")
        .context("Invalid --bind address")?;
    let database_url: Option<String> = pargs
        .opt_value_from_str("--db-url")
        .context("Invalid --db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, database_url)?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported on {addr}");
    }

    info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    info!("Database connected and migrated");

    let services = AccessServices::new(
        Arc::new(db.store()),
        Arc::new(SystemClock),
        ServiceSettings {
            policy: config.policy.clone(),
            credentials: config.security.credentials(),
            lockout: config.lockout.clone(),
            jwt_secret: config.security.jwt_secret.clone(),
        },
    )
    .context("Failed to initialize access services")?;

    if !config.security.cookie_secure {
        warn!("COOKIE_SECURE=false: session cookies will be sent over plain HTTP");
    }

    let state = api::AppState {
        services: Arc::new(services),
        database: Some(db.clone()),
        cookies: CookieSettings {
            secure: config.security.cookie_secure,
        },
        policy: config.policy.clone(),
    };

    let app = api::create_router(state);

    info!("Starting HTTP server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
