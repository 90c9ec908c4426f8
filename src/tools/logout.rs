//! Handler for the `facebook_logout` tool.

use std::sync::Arc;

use crate::facebook::GraphClient;
use crate::model::{JsonObject, ToolResult};
use crate::schema::ParametersSchema;
use crate::tools::{ToolFuture, ToolHandler};

pub struct LogoutHandler {
    client: Arc<GraphClient>,
}

impl LogoutHandler {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

impl ToolHandler for LogoutHandler {
    fn name(&self) -> &str {
        "facebook_logout"
    }

    fn description(&self) -> &str {
        "Logout from Facebook and clear stored credentials"
    }

    fn parameters(&self) -> ParametersSchema {
        ParametersSchema::empty()
    }

    fn execute(&self, _args: JsonObject) -> ToolFuture<'_> {
        Box::pin(async move {
            let text = if self.client.tokens().clear().await? {
                "Logged out from Facebook. The stored access token has been removed."
            } else {
                "You are not currently logged in to Facebook."
            };
            Ok(ToolResult::text(text))
        })
    }
}
