// HTTP bindings for the vendor function-calling protocols

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::adapters::{Failure, GeminiAdapter, OpenAiAdapter, ProtocolAdapter, invoke};
use crate::catalog::ToolCatalog;
use crate::error::ToolError;
use crate::tools::Dispatcher;

/// Largest request body accepted on any route.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Protocols this process serves, as reported by `/health`.
pub const PROTOCOLS: [&str; 3] = ["mcp", "openai", "gemini"];

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub catalog: Arc<ToolCatalog>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, catalog: Arc<ToolCatalog>) -> Self {
        Self {
            dispatcher,
            catalog,
        }
    }
}

/// `{functions: [...]}`, the envelope for vendor tool declarations.
#[derive(Serialize)]
pub struct Definitions<T> {
    pub functions: Vec<T>,
}

/// The vendor routes plus the admin endpoints, without middleware.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/tools", get(list_tools))
        .route("/openai/functions", post(call_openai))
        .route("/openai/functions/definitions", get(openai_definitions))
        .route("/gemini/functions", post(call_gemini))
        .route("/gemini/functions/definitions", get(gemini_definitions))
        .with_state(state)
}

/// Body limit, request tracing and permissive CORS.
pub fn with_layers(router: Router) -> Router {
    router.layer(DefaultBodyLimit::max(MAX_BODY_BYTES)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

pub fn create_router(state: AppState) -> Router {
    with_layers(routes(state))
}

/// HTTP status for a failed call.
pub fn status_for(error: &ToolError) -> StatusCode {
    match error {
        ToolError::MalformedRequest(_) | ToolError::Validation(_) | ToolError::UnknownTool(_) => {
            StatusCode::BAD_REQUEST
        }
        ToolError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        ToolError::UpstreamApi { .. } => StatusCode::BAD_GATEWAY,
        ToolError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ToolError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "protocols": PROTOCOLS,
        "tools": state.catalog.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({ "tools": state.catalog.summaries() }))
}

/// Decode the body ourselves so that bad JSON still gets the protocol's
/// error shape rather than axum's plain-text rejection.
async fn handle_call<A: ProtocolAdapter>(adapter: A, state: &AppState, body: &[u8]) -> Response {
    let raw = match serde_json::from_slice::<Value>(body) {
        Ok(raw) => raw,
        Err(e) => {
            let error = ToolError::MalformedRequest(format!("request body is not valid JSON: {}", e));
            debug!(protocol = adapter.name(), "rejecting unparseable body");
            let body = adapter.format_error(&error, None);
            return (status_for(&error), Json(body)).into_response();
        }
    };

    match invoke(&adapter, &state.dispatcher, &raw).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(Failure { error, body }) => (status_for(&error), Json(body)).into_response(),
    }
}

async fn call_openai(State(state): State<AppState>, body: Bytes) -> Response {
    handle_call(OpenAiAdapter, &state, &body).await
}

async fn call_gemini(State(state): State<AppState>, body: Bytes) -> Response {
    handle_call(GeminiAdapter, &state, &body).await
}

async fn openai_definitions(State(state): State<AppState>) -> impl IntoResponse {
    Json(Definitions {
        functions: OpenAiAdapter.tool_definitions(&state.catalog),
    })
}

async fn gemini_definitions(State(state): State<AppState>) -> impl IntoResponse {
    Json(Definitions {
        functions: GeminiAdapter.tool_definitions(&state.catalog),
    })
}
