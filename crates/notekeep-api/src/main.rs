//! notekeep-api - HTTP API server for notekeep

use tracing::{info, warn};

use notekeep_api::auth::JwtVerifier;
use notekeep_api::config::{ServerConfig, StoreKind};
use notekeep_api::state::AppState;
use notekeep_api::telemetry::{init_tracing, LogConfig};
use notekeep_db::{log_pool_metrics, Database, MemoryStore, PoolConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - standard env filter
    let _log_guard = init_tracing(&LogConfig::from_env());

    let config = ServerConfig::from_env()?;
    let verifier = JwtVerifier::new(&config.jwt_secret);

    let state = match config.store {
        StoreKind::Postgres => {
            let pool_config = PoolConfig::new().max_connections(config.db_max_connections);
            let db = Database::connect_with_config(&config.database_url, pool_config).await?;
            db.migrate().await?;
            log_pool_metrics(db.pool());
            info!(subsystem = "db", "Database ready");
            AppState::with_database(&db, verifier)
        }
        StoreKind::Memory => {
            warn!("Using in-memory store; data will not survive a restart");
            AppState::with_memory_store(MemoryStore::new(), verifier)
        }
    };

    let app = notekeep_api::app(state, &config);

    let addr = config.socket_addr()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
