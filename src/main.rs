//! USDC Bridge Server
//!
//! Moves USDC between two independent EVM chains by debiting a custodial
//! pool on the source chain and crediting a mirror pool on the destination
//! chain. The chains share no atomicity guarantee; the orchestrator produces
//! a ledger-consistent outcome through strict sequencing and a single
//! compensating reversal.

use std::sync::Arc;

use usdc_bridge::api::{self, AppState};
use usdc_bridge::bridge::BridgeOrchestrator;
use usdc_bridge::chains::ChainRegistry;
use usdc_bridge::config::Config;
use usdc_bridge::db::{self, PgBridgingLogStore};
use usdc_bridge::metrics;

fn main() -> eyre::Result<()> {
    // Install color-eyre for better error reporting
    color_eyre::install()?;

    // Run the async main
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    init_logging();

    tracing::info!("Starting USDC Bridge Server");

    let config = Config::load()?;
    tracing::info!(
        chains = config.chains.len(),
        inclusion_timeout_secs = config.bridge.inclusion_timeout_secs,
        "Configuration loaded"
    );

    // Connect to database and run migrations
    let pool = db::create_pool(&config.database.url).await?;
    tracing::info!("Database connected");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // Build the ledger registry and orchestrator
    let registry = Arc::new(ChainRegistry::from_config(&config)?);
    let logs = Arc::new(PgBridgingLogStore::new(pool));
    let orchestrator = BridgeOrchestrator::new(registry.clone(), logs.clone());

    let state = AppState {
        orchestrator,
        logs,
        chain_count: registry.len(),
        ledgers: registry,
    };

    metrics::UP.set(1.0);

    tokio::select! {
        result = api::start_server(&config.server.bind_address, config.server.port, state) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "API server error");
            }
        }
        _ = wait_for_shutdown_signal() => {}
    }

    metrics::UP.set(0.0);
    tracing::info!("USDC Bridge Server stopped");
    Ok(())
}

/// Initialize tracing/logging with structured output
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,usdc_bridge=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(filter)
        .init();
}

/// Wait for shutdown signals (SIGINT/SIGTERM)
async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
