//! Handler for the `facebook_fetch_pagination_url` tool.

use std::sync::Arc;

use url::Url;

use crate::error::ToolError;
use crate::facebook::GraphClient;
use crate::model::{JsonObject, ToolResult};
use crate::schema::{ParametersSchema, PropertySchema, validate_args};
use crate::tools::args::required_str;
use crate::tools::{ToolFuture, ToolHandler};

pub struct FetchPaginationHandler {
    client: Arc<GraphClient>,
}

impl FetchPaginationHandler {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

impl ToolHandler for FetchPaginationHandler {
    fn name(&self) -> &str {
        "facebook_fetch_pagination_url"
    }

    fn description(&self) -> &str {
        "Fetch data from a Facebook Graph API pagination URL"
    }

    fn parameters(&self) -> ParametersSchema {
        ParametersSchema::default()
            .property(
                "url",
                PropertySchema::string().describe("The complete pagination URL"),
            )
            .require(["url"])
            .closed()
    }

    fn execute(&self, args: JsonObject) -> ToolFuture<'_> {
        Box::pin(async move {
            validate_args(&self.parameters(), &args)?;
            let raw = required_str(&args, "url")?;

            let url = Url::parse(raw)
                .map_err(|_| ToolError::invalid_field("url", "Invalid URL format"))?;
            if !self.client.is_graph_url(&url) {
                return Err(ToolError::invalid_field(
                    "url",
                    "must be a Graph API pagination URL",
                ));
            }

            let data = self.client.get_url(&url).await?;
            Ok(ToolResult::pretty_json(&data))
        })
    }
}
