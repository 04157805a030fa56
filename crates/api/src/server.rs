use anyhow::{Context, Result};
use askroute_common::SystemConfig;
use askroute_orchestrator::Assistant;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::middleware::logging::{get_tracing_layer, logging_middleware};
use crate::routes::{chat::chat, health::health};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
}

/// Routes, request logging, tracing and permissive CORS
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(axum::middleware::from_fn(logging_middleware))
        .layer(get_tracing_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct ApiServer {
    config: SystemConfig,
    state: AppState,
}

impl ApiServer {
    /// Build every collaborator once from `config`
    pub async fn new(config: SystemConfig) -> Result<Self> {
        let assistant = Assistant::from_config(&config).await?;
        Ok(Self::with_assistant(config, Arc::new(assistant)))
    }

    pub fn with_assistant(config: SystemConfig, assistant: Arc<Assistant>) -> Self {
        Self {
            config,
            state: AppState { assistant },
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("askroute server listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        info!("askroute server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
