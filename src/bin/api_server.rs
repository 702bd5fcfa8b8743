// src/bin/api_server.rs

use reel_rating::infra::config::{Config, StoreBackend};
use reel_rating::infra::telemetry;
use reel_rating::storage::docs::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore};
use reel_rating::transport;
use anyhow::Context;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();
    let config = Config::from_env()?;

    // --- Store Initialization ---
    let store: Arc<dyn DocumentStore> = match (config.backend, config.database.as_ref()) {
        (StoreBackend::Postgres, Some(database)) => {
            info!(max_connections = database.max_connections, "connecting to PostgreSQL");
            let store = PostgresDocumentStore::connect(database)
                .await
                .context("failed to connect to PostgreSQL")?;
            store
                .ensure_schema()
                .await
                .context("failed to create the documents table")?;
            info!("document schema ready");
            Arc::new(store)
        }
        (StoreBackend::Postgres, None) => anyhow::bail!("postgres backend selected without DATABASE_URL"),
        (StoreBackend::Memory, _) => {
            warn!("using the in-memory store; data is lost on shutdown");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    let app_state = transport::http::AppState::new(store);

    // --- API Server Initialization ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("graceful shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("shutdown signal received (Ctrl+C)"),
        _ = terminate => info!("shutdown signal received (SIGTERM)"),
    }
}
