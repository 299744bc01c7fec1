mod api;
mod app;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::AppState;
use promptbridge_core::{Brain, IntentClassifier, McpClient, PromptOrchestrator, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging Setup
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    info!("PromptBridge Gateway Initializing...");
    let settings = Settings::from_env()?;

    // The Brain (LLM)
    info!("Connecting to OpenAI Brain...");
    let brain = Brain::new(&settings.llm);
    if settings.startup_check {
        match brain.say_hello().await {
            Ok(msg) => info!("Brain Status: {}", msg),
            Err(e) => error!("Brain is configured but unresponsive: {}", e),
        }
    }

    // The Tool Server
    let tools =
        McpClient::new(&settings.tool_server)?.with_router(settings.operation_router.clone());
    info!("Using MCP server at {}", tools.base_url());
    info!(
        "Tool intent keywords: {}",
        settings.intent_keywords.keywords().join(", ")
    );

    let orchestrator = PromptOrchestrator::new(
        Arc::new(brain),
        Arc::new(tools),
        IntentClassifier::new(settings.intent_keywords.clone()),
    );
    let app = app::router(AppState::new(orchestrator));

    let listener = TcpListener::bind(&settings.gateway_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.gateway_addr))?;
    info!("Gateway listening on {}...", settings.gateway_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway server failed")?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down gateway...");
}
