//! Handler for the `facebook_get_details_of_ad_account` tool.

use std::sync::Arc;

use crate::facebook::GraphClient;
use crate::model::{JsonObject, ToolResult};
use crate::schema::{ParametersSchema, PropertySchema, validate_args};
use crate::tools::args::{required_str, string_list};
use crate::tools::{ToolFuture, ToolHandler};

pub struct AccountDetailsHandler {
    client: Arc<GraphClient>,
}

impl AccountDetailsHandler {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

impl ToolHandler for AccountDetailsHandler {
    fn name(&self) -> &str {
        "facebook_get_details_of_ad_account"
    }

    fn description(&self) -> &str {
        "Get details of a specific ad account as per the fields provided"
    }

    fn parameters(&self) -> ParametersSchema {
        ParametersSchema::default()
            .property(
                "act_id",
                PropertySchema::string()
                    .describe("The act ID of the ad account, example: act_1234567890"),
            )
            .property(
                "fields",
                PropertySchema::array_of(PropertySchema::string()).describe(
                    "Fields to retrieve. Available: name, business_name, age, account_status, \
                     balance, amount_spent, attribution_spec, account_id, business, \
                     business_city, brand_safety_content_filter_levels, currency, \
                     created_time, id",
                ),
            )
            .require(["act_id"])
            .closed()
    }

    fn execute(&self, args: JsonObject) -> ToolFuture<'_> {
        Box::pin(async move {
            validate_args(&self.parameters(), &args)?;
            let act_id = required_str(&args, "act_id")?;

            let fields = string_list(&args, "fields");
            let mut params = Vec::new();
            if !fields.is_empty() {
                params.push(("fields", fields.join(",")));
            }

            let data = self.client.get(act_id, &params).await?;
            Ok(ToolResult::pretty_json(&data))
        })
    }
}
