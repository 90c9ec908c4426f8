//! Tool registry for the Facebook Ads tool handlers.
//!
//! Provides a `ToolHandler` trait for implementing tools and a `ToolRegistry`
//! that keeps them in registration order.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ToolError;
use crate::model::{JsonObject, ToolResult};
use crate::schema::ParametersSchema;
use crate::types::ToolName;

/// Boxed future returned by [`ToolHandler::execute`].
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolResult, ToolError>> + Send + 'a>>;

/// Trait for handling tool invocations, whichever protocol they arrive on.
///
/// Each tool implements this trait to define its schema and execution logic.
pub trait ToolHandler: Send + Sync {
    /// Returns the tool's name (e.g., "facebook_list_ad_accounts").
    fn name(&self) -> &str;

    /// Returns the tool's description.
    fn description(&self) -> &str;

    /// Returns the argument schema for this tool.
    fn parameters(&self) -> ParametersSchema;

    /// Executes the tool with the given arguments.
    fn execute(&self, args: JsonObject) -> ToolFuture<'_>;
}

/// Registry for managing tool handlers.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: IndexMap<ToolName, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool handler. A later handler with the same name replaces
    /// the earlier one but keeps its position.
    pub fn register(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.handlers.insert(ToolName::new(handler.name()), handler);
        self
    }

    /// Register a tool handler from a type that implements `ToolHandler`.
    pub fn register_handler<T: ToolHandler + 'static>(self, handler: T) -> Self {
        self.register(Arc::new(handler))
    }

    /// Get a tool handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Handlers in registration order.
    pub fn handlers(&self) -> impl Iterator<Item = &Arc<dyn ToolHandler>> {
        self.handlers.values()
    }

    /// List all registered tool names in registration order.
    pub fn list_names(&self) -> Vec<ToolName> {
        self.handlers.keys().cloned().collect()
    }

    /// Return the number of registered tools.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Return `true` if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
