//! Handler for the `facebook_get_adaccount_insights` tool.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::account_activities::time_range_schema;
use super::insights_format::format_insights;
use crate::facebook::GraphClient;
use crate::model::{JsonObject, ToolResult, render_json};
use crate::schema::{ParametersSchema, PropertySchema, validate_args};
use crate::tools::args::{
    ensure_positive, forward_params, non_empty_list, optional_str, required_str,
};
use crate::tools::{ToolFuture, ToolHandler};

const DEFAULT_LEVEL: &str = "account";

pub struct AccountInsightsHandler {
    client: Arc<GraphClient>,
}

impl AccountInsightsHandler {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

/// Requested fields, with `conversions` added whenever `actions` is asked for.
pub fn insights_fields(requested: &[String]) -> Vec<String> {
    let mut fields = requested.to_vec();
    let wants = |name: &str| fields.iter().any(|f| f == name);
    if wants("actions") && !wants("conversions") {
        fields.push("conversions".to_string());
    }
    fields
}

fn render(data: &Value) -> String {
    let rows = data
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut text = if rows.is_empty() {
        "No insights data found.".to_string()
    } else {
        format_insights(rows)
    };
    text.push_str("\n\n**Raw API Response:**\n```json\n");
    text.push_str(&render_json(data));
    text.push_str("\n```");
    text
}

impl ToolHandler for AccountInsightsHandler {
    fn name(&self) -> &str {
        "facebook_get_adaccount_insights"
    }

    fn description(&self) -> &str {
        "Retrieves performance insights for a specified Facebook ad account"
    }

    fn parameters(&self) -> ParametersSchema {
        let strings = || PropertySchema::array_of(PropertySchema::string());
        ParametersSchema::default()
            .property(
                "act_id",
                PropertySchema::string().describe("The target ad account ID, prefixed with act_"),
            )
            .property("fields", strings().describe("Performance metrics to retrieve"))
            .property(
                "date_preset",
                PropertySchema::string()
                    .describe("Predefined time range: last_7d, last_30d, last_90d, etc."),
            )
            .property(
                "level",
                PropertySchema::string()
                    .describe("Aggregation level: account, campaign, adset, ad"),
            )
            .property(
                "action_attribution_windows",
                strings().describe("Attribution windows for actions"),
            )
            .property(
                "action_breakdowns",
                strings().describe("Breakdown dimensions for actions"),
            )
            .property("breakdowns", strings().describe("Result breakdown dimensions"))
            .property(
                "time_range",
                time_range_schema("Custom time range with since/until dates"),
            )
            .property(
                "time_increment",
                PropertySchema::default()
                    .describe("Days per row (1 for daily rows), or monthly / all_days"),
            )
            .property(
                "limit",
                PropertySchema::number().describe("Maximum results per page"),
            )
            .property("sort", PropertySchema::string().describe("Sort field and direction"))
            .property(
                "after",
                PropertySchema::string().describe("Pagination cursor for next page"),
            )
            .property(
                "before",
                PropertySchema::string().describe("Pagination cursor for previous page"),
            )
            .require(["act_id", "fields"])
            .closed()
    }

    fn execute(&self, args: JsonObject) -> ToolFuture<'_> {
        Box::pin(async move {
            let schema = self.parameters();
            validate_args(&schema, &args)?;
            ensure_positive(&args, "limit")?;
            let act_id = required_str(&args, "act_id")?;
            let requested = non_empty_list(&args, "fields", "field")?;

            let fields = insights_fields(&requested);
            if fields.len() != requested.len() {
                debug!("added conversions to requested insights fields");
            }

            let mut params = vec![
                ("fields", fields.join(",")),
                (
                    "level",
                    optional_str(&args, "level")
                        .unwrap_or(DEFAULT_LEVEL)
                        .to_string(),
                ),
            ];
            params.extend(forward_params(
                &schema,
                &args,
                &["act_id", "fields", "level"],
            ));

            let data = self
                .client
                .get(&format!("{}/insights", act_id), &params)
                .await?;
            Ok(ToolResult::text(render(&data)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::facebook::{client_for, spawn_stub};
    use axum::{Json, Router, extract::Query, routing::get};
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_conversions_added_with_actions() {
        let requested = vec!["spend".to_string(), "actions".to_string()];
        assert_eq!(
            insights_fields(&requested),
            vec!["spend", "actions", "conversions"]
        );

        let already = vec!["actions".to_string(), "conversions".to_string()];
        assert_eq!(insights_fields(&already), already);
    }

    #[tokio::test]
    async fn test_request_shape_and_rendering() {
        let router = Router::new().route(
            "/v18.0/act_5/insights",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "data": [{"spend": "12.5", "impressions": "1000"}],
                    "sent": q
                }))
            }),
        );
        let base = spawn_stub(router).await;
        let dir = TempDir::new().unwrap();
        let handler = AccountInsightsHandler::new(Arc::new(client_for(&base, &dir, Some("t"))));

        let args = json!({
            "act_id": "act_5",
            "fields": ["spend", "impressions", "actions"],
            "breakdowns": ["age", "gender"],
            "time_increment": 1
        });
        let text = handler
            .execute(args.as_object().cloned().unwrap())
            .await
            .unwrap()
            .joined_text();

        assert!(text.starts_with("**Account Performance:**\n\nSpend: $12.50\nImpressions: 1,000\n"));
        assert!(text.contains("**Raw API Response:**"));
        assert!(text.contains("\"fields\": \"spend,impressions,actions,conversions\""));
        assert!(text.contains("\"level\": \"account\""));
        assert!(text.contains("\"breakdowns\": \"age,gender\""));
        assert!(text.contains("\"time_increment\": \"1\""));
    }

    #[tokio::test]
    async fn test_empty_fields_rejected() {
        let dir = TempDir::new().unwrap();
        let handler = AccountInsightsHandler::new(Arc::new(client_for(
            "http://127.0.0.1:9",
            &dir,
            Some("t"),
        )));
        let args = json!({"act_id": "act_5", "fields": []});
        let err = handler
            .execute(args.as_object().cloned().unwrap())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::Validation(vec!["fields: at least one field is required".into()])
        );
    }

    #[test]
    fn test_render_without_rows() {
        let text = render(&json!({"data": []}));
        assert!(text.starts_with("No insights data found.\n\n**Raw API Response:**"));
    }
}
