//! Handler for the `facebook_get_activities_by_adaccount` tool.

use std::sync::Arc;

use crate::facebook::GraphClient;
use crate::model::{JsonObject, ToolResult};
use crate::schema::{ParametersSchema, PropertySchema, validate_args};
use crate::tools::args::{ensure_positive, forward_params, required_str};
use crate::tools::{ToolFuture, ToolHandler};

pub struct AccountActivitiesHandler {
    client: Arc<GraphClient>,
}

impl AccountActivitiesHandler {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn time_range_schema(description: &str) -> PropertySchema {
    PropertySchema::object([
        ("since", PropertySchema::string()),
        ("until", PropertySchema::string()),
    ])
    .require(["since", "until"])
    .describe(description)
}

impl ToolHandler for AccountActivitiesHandler {
    fn name(&self) -> &str {
        "facebook_get_activities_by_adaccount"
    }

    fn description(&self) -> &str {
        "Retrieves activities for a Facebook ad account"
    }

    fn parameters(&self) -> ParametersSchema {
        ParametersSchema::default()
            .property(
                "act_id",
                PropertySchema::string().describe("Ad account ID prefixed with act_"),
            )
            .property(
                "fields",
                PropertySchema::array_of(PropertySchema::string())
                    .describe("Activity fields to retrieve"),
            )
            .property(
                "since",
                PropertySchema::string().describe("Start date in YYYY-MM-DD format"),
            )
            .property(
                "until",
                PropertySchema::string().describe("End date in YYYY-MM-DD format"),
            )
            .property("time_range", time_range_schema("Custom time range object"))
            .property(
                "limit",
                PropertySchema::number().describe("Maximum activities per page"),
            )
            .property("after", PropertySchema::string().describe("Pagination cursor"))
            .property("before", PropertySchema::string().describe("Pagination cursor"))
            .require(["act_id"])
            .closed()
    }

    fn execute(&self, args: JsonObject) -> ToolFuture<'_> {
        Box::pin(async move {
            let schema = self.parameters();
            validate_args(&schema, &args)?;
            ensure_positive(&args, "limit")?;
            let act_id = required_str(&args, "act_id")?;

            let params = forward_params(&schema, &args, &["act_id"]);
            let data = self
                .client
                .get(&format!("{}/activities", act_id), &params)
                .await?;
            Ok(ToolResult::pretty_json(&data))
        })
    }
}
