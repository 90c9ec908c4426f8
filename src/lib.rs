// Core modules
pub mod config;
pub mod error;
pub mod facebook;
pub mod model;
pub mod schema;
pub mod types;

// Protocol normalization
pub mod adapters;
pub mod catalog;
pub mod tools;

// Transports
pub mod api;
pub mod server;

// Re-export key types and functions
pub use adapters::{GeminiAdapter, McpAdapter, OpenAiAdapter, ProtocolAdapter};
pub use catalog::ToolCatalog;
pub use config::{ConfigArgs, FacebookConfig, ServerConfig, ServerMode};
pub use error::ToolError;
pub use model::{ContentItem, NormalizedCall, ProtocolRequest, ToolResult};
pub use server::McpServer;
pub use tools::{Dispatcher, ToolHandler, ToolRegistry};

use std::sync::Arc;

use anyhow::Result;
use facebook::{GraphClient, TokenStore};

/// Everything a transport needs, built once from the configuration.
pub struct AppContext {
    pub config: ServerConfig,
    pub client: Arc<GraphClient>,
    pub catalog: Arc<ToolCatalog>,
    pub dispatcher: Dispatcher,
}

impl AppContext {
    /// Build the Graph client, register every tool and derive the catalog.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let tokens = Arc::new(TokenStore::new(config.facebook.token_path.clone()));
        let client = Arc::new(GraphClient::new(&config.facebook, tokens)?);

        let registry = Arc::new(tools::build_registry(client.clone()));
        let catalog = ToolCatalog::from_registry(&registry);
        catalog.verify_registry(&registry)?;

        tracing::debug!(tools = catalog.len(), "tool catalog ready");

        Ok(Self {
            config,
            client,
            catalog: Arc::new(catalog),
            dispatcher: Dispatcher::new(registry),
        })
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        self.client.tokens()
    }

    pub fn mcp_server(&self) -> McpServer {
        McpServer::new(
            self.dispatcher.clone(),
            self.catalog.clone(),
            self.config.name.clone(),
            self.config.version.clone(),
        )
    }

    pub fn app_state(&self) -> api::AppState {
        api::AppState::new(self.dispatcher.clone(), self.catalog.clone())
    }
}
