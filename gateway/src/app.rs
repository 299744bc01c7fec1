use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api;
use promptbridge_core::{PromptOrchestrator, PromptRequest, PromptResponse};

pub const HEALTH_TEXT: &str = "PromptBridge Gateway: Operational";

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<PromptOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: PromptOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/prompt", post(submit_prompt))
        .route("/mcp/tools", get(list_mcp_tools));

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- HANDLERS ---

async fn health_check() -> &'static str {
    HEALTH_TEXT
}

async fn submit_prompt(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Response {
    let request = match api::validated(payload) {
        Ok(request) => request,
        Err(rejected) => {
            info!("Rejected prompt request: {:?}", rejected.details);
            return rejected.into_response();
        }
    };

    info!("Processing prompt: {}", request.prompt);
    match state.orchestrator.process(&request).await {
        Ok(response) => {
            info!(used_tools = response.used_tools, "Prompt processed successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Error processing prompt: {}", e);
            let body = PromptResponse::failure(format!("Error processing prompt: {}", e));
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

async fn list_mcp_tools(State(state): State<AppState>) -> Response {
    match state.orchestrator.available_tools().await {
        Ok(tools) => (StatusCode::OK, Json(tools)).into_response(),
        Err(e) => {
            error!("Error fetching MCP tools: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error fetching MCP tools: {:#}", e),
            )
                .into_response()
        }
    }
}
