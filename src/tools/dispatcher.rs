use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::ToolRegistry;
use crate::error::ToolError;
use crate::model::{NormalizedCall, ToolResult};

/// Routes a normalized call to its handler. Identical for every protocol.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub async fn dispatch(&self, call: NormalizedCall) -> Result<ToolResult, ToolError> {
        let NormalizedCall {
            tool_name,
            args,
            call_id,
        } = call;

        let Some(handler) = self.registry.get(tool_name.as_str()) else {
            warn!(tool = %tool_name, "unknown tool requested");
            return Err(ToolError::UnknownTool(tool_name.into_inner()));
        };

        debug!(tool = %tool_name, args = ?args, "dispatching tool call");
        let started = Instant::now();
        let result = handler.execute(args).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let call_id = call_id.as_ref().map(|id| id.as_str()).unwrap_or("-");
        match &result {
            Ok(_) => info!(tool = %tool_name, call_id, elapsed_ms, "tool call finished"),
            Err(e) => warn!(
                tool = %tool_name,
                call_id,
                elapsed_ms,
                code = e.code(),
                "tool call failed: {}",
                e
            ),
        }

        result
    }
}
