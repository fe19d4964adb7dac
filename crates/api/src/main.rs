//! FxDAO vaults API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fxdao_chain::{SafetyPoolClient, VaultsClient};
use fxdao_common::config::AppConfig;

use fxdao_api::routes::create_router;
use fxdao_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("fxdao_api=debug,fxdao_engine=debug,fxdao_chain=info,tower_http=debug")
        }))
        .json()
        .init();

    tracing::info!("Starting FxDAO vaults API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Contract readers (no connection is opened until the first request)
    let client = VaultsClient::from_config(&config)?;
    let safety_pool = SafetyPoolClient::from_config(&config)?;

    // Build application state
    let port = config.api_port;
    let mut state = AppState::new(Arc::new(client), config);
    if let Some(pool) = safety_pool {
        state = state.with_safety_pool(Arc::new(pool));
    }

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    Ok(())
}
