//! Handler for the `facebook_list_ad_accounts` tool.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::error::ToolError;
use crate::facebook::GraphClient;
use crate::model::{JsonObject, ToolResult};
use crate::schema::ParametersSchema;
use crate::tools::{ToolFuture, ToolHandler};

pub struct ListAdAccountsHandler {
    client: Arc<GraphClient>,
}

impl ListAdAccountsHandler {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

impl ToolHandler for ListAdAccountsHandler {
    fn name(&self) -> &str {
        "facebook_list_ad_accounts"
    }

    fn description(&self) -> &str {
        "List all Facebook ad accounts accessible with the provided credentials"
    }

    fn parameters(&self) -> ParametersSchema {
        ParametersSchema::empty()
    }

    fn execute(&self, _args: JsonObject) -> ToolFuture<'_> {
        Box::pin(async move {
            let me = self.client.get("me", &[("fields", "id".into())]).await?;
            let user_id = me
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::UpstreamApi {
                    status: None,
                    code: None,
                    message: "Graph API did not return a user id".to_string(),
                })?
                .to_string();

            let accounts = self
                .client
                .get(
                    &format!("{}/adaccounts", user_id),
                    &[("fields", "name,id".into())],
                )
                .await?;

            Ok(ToolResult::pretty_json(&json!({
                "adaccounts": accounts,
                "id": user_id,
            })))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facebook::{client_for, spawn_stub};
    use axum::{Json, Router, routing::get};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_lists_accounts_for_current_user() {
        let router = Router::new()
            .route("/v18.0/me", get(|| async { Json(json!({"id": "7"})) }))
            .route(
                "/v18.0/7/adaccounts",
                get(|| async { Json(json!({"data": [{"id": "act_1", "name": "Main"}]})) }),
            );
        let base = spawn_stub(router).await;
        let dir = TempDir::new().unwrap();
        let handler = ListAdAccountsHandler::new(Arc::new(client_for(&base, &dir, Some("t"))));

        let text = handler.execute(JsonObject::new()).await.unwrap().joined_text();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["id"], "7");
        assert_eq!(parsed["adaccounts"]["data"][0]["id"], "act_1");
    }
}
