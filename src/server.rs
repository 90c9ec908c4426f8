//! MCP server implementation using rmcp.
//!
//! Serves the tool catalog over stdio or Streamable HTTP. Requests go through
//! the same adapter and dispatcher as the vendor HTTP routes.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{
    ErrorData as McpError, ServiceExt,
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
};
use serde_json::json;
use tracing::info;

use crate::adapters::{Failure, McpAdapter, ProtocolAdapter, invoke};
use crate::api::{self, AppState};
use crate::catalog::ToolCatalog;
use crate::tools::Dispatcher;

const INSTRUCTIONS: &str = "Facebook Ads tools backed by the Graph Marketing API: \
    ad accounts, insights, activities, creatives and thumbnails. \
    Run facebook_check_auth first if a call reports that no token is available.";

/// MCP server that hands every tool call to the shared dispatcher.
#[derive(Clone)]
pub struct McpServer {
    dispatcher: Dispatcher,
    catalog: Arc<ToolCatalog>,
    /// Tool declarations, rendered once from the catalog.
    tools: Arc<Vec<Tool>>,
    name: String,
    version: String,
}

impl McpServer {
    pub fn new(
        dispatcher: Dispatcher,
        catalog: Arc<ToolCatalog>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let tools = Arc::new(McpAdapter.tool_definitions(&catalog));
        Self {
            dispatcher,
            catalog,
            tools,
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run one `tools/call` through the MCP adapter.
    pub async fn call(&self, request: CallToolRequestParams) -> Result<CallToolResult, McpError> {
        let raw = json!({
            "method": "tools/call",
            "params": {
                "name": request.name,
                "arguments": request.arguments,
            }
        });
        invoke(&McpAdapter, &self.dispatcher, &raw)
            .await
            .map_err(|Failure { body, .. }| body)
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                ..Implementation::from_build_env()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let result = ListToolsResult {
            tools: self.tools.as_ref().clone(),
            next_cursor: None,
            ..Default::default()
        };
        std::future::ready(Ok(result))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        self.call(request)
    }
}

/// Serve MCP over stdin/stdout until the client disconnects.
pub async fn serve_stdio(server: McpServer) -> Result<()> {
    info!("Starting MCP stdio server with {} tools", server.catalog.len());

    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("serving error: {:?}", e))?;

    service.waiting().await?;
    info!("MCP stdio server session ended");
    Ok(())
}

/// The vendor routes plus MCP Streamable HTTP at `/mcp`, with middleware.
pub fn http_router(server: McpServer, state: AppState) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    api::with_layers(api::routes(state).nest_service("/mcp", service))
}

/// Serve the HTTP router on `bind` until the process stops.
pub async fn start_http(server: McpServer, state: AppState, bind: &str) -> Result<()> {
    let router = http_router(server, state);
    let listener = tokio::net::TcpListener::bind(bind).await?;

    info!("HTTP server listening on http://{}", bind);
    info!("  MCP:    http://{}/mcp", bind);
    info!("  OpenAI: http://{}/openai/functions", bind);
    info!("  Gemini: http://{}/gemini/functions", bind);

    axum::serve(listener, router).await?;
    Ok(())
}
