use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::handlers::{app, AppState};
use crate::ledger::{NurseryLedger, PgLedgerStore};

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Tree Nursery API in {:?} mode", config.environment);

    let database = DatabaseManager::connect_lazy(&config.database)?;
    if config.database.run_migrations {
        database.migrate().await?;
        tracing::info!("Database migrations applied");
    }

    let store = PgLedgerStore::new(database.pool().clone());
    let ledger = NurseryLedger::new(Arc::new(store));

    let bind_addr = config.bind_addr();
    let state = AppState::new(ledger, config);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;
    tracing::info!("Tree Nursery API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
