//! plants-api server binary

use std::sync::Arc;

use anyhow::Context;

use plants_api::api::{create_router, AppState};
use plants_api::config::AppConfig;
use plants_api::storage::{create_store, PlantStore};
use plants_api::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    let telemetry = telemetry::init(&config.logging, &config.tracing)
        .context("failed to initialise tracing")?;

    let storage_config = config
        .storage_runtime()
        .context("invalid storage configuration")?;

    let store: Arc<dyn PlantStore> = Arc::from(
        create_store(storage_config)
            .await
            .context("failed to connect to database")?,
    );

    store
        .ensure_schema()
        .await
        .context("failed to ensure plants table")?;
    tracing::info!(backend = store.backend_name(), "Plants table ready");

    let router = create_router(AppState::new(store));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!(%addr, "Listening for HTTP traffic");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    telemetry.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
