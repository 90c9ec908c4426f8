//! MCP (JSON-RPC `tools/list` / `tools/call`) adapter.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content, Tool};
use serde_json::Value;

use super::{ProtocolAdapter, call, call_arguments, tool_name};
use crate::catalog::ToolCatalog;
use crate::error::ToolError;
use crate::model::{ContentItem, ProtocolRequest, ToolResult, render_json};
use crate::schema::TypeVocabulary;
use crate::types::CallId;

#[derive(Debug, Clone, Copy, Default)]
pub struct McpAdapter;

fn to_content(item: &ContentItem) -> Content {
    match item {
        ContentItem::Text { text } => Content::text(text.clone()),
        ContentItem::Image { data, mime_type } => Content::image(data.clone(), mime_type.clone()),
    }
}

impl ProtocolAdapter for McpAdapter {
    type Response = CallToolResult;
    type ToolDefinition = Tool;
    type ErrorResponse = McpError;

    fn name(&self) -> &'static str {
        "mcp"
    }

    fn parse_request(&self, raw: &Value) -> Result<ProtocolRequest, ToolError> {
        let method = raw
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::MalformedRequest("missing JSON-RPC method".to_string()))?;

        match method {
            "tools/list" => Ok(ProtocolRequest::ListTools),
            "tools/call" => {
                let params = raw
                    .get("params")
                    .filter(|p| p.is_object())
                    .ok_or_else(|| {
                        ToolError::MalformedRequest("tools/call requires params".to_string())
                    })?;
                let name = tool_name(params.get("name"), "tools/call")?;
                let args = call_arguments(params.get("arguments"))?;
                Ok(call(name, args))
            }
            other => Err(ToolError::MalformedRequest(format!(
                "unsupported method: {}",
                other
            ))),
        }
    }

    fn format_response(&self, result: &ToolResult, _call_id: Option<&CallId>) -> CallToolResult {
        match result {
            ToolResult::Content(content) => CallToolResult {
                content: content.iter().map(to_content).collect(),
                structured_content: None,
                is_error: Some(false),
                meta: None,
            },
            ToolResult::Text(text) => CallToolResult {
                content: vec![Content::text(text.clone())],
                structured_content: None,
                is_error: Some(false),
                meta: None,
            },
            ToolResult::Json(value) => CallToolResult {
                content: vec![Content::text(render_json(value))],
                structured_content: Some(value.clone()),
                is_error: Some(false),
                meta: None,
            },
        }
    }

    fn tool_definitions(&self, catalog: &ToolCatalog) -> Vec<Tool> {
        catalog
            .entries()
            .iter()
            .map(|entry| {
                let schema = entry.parameters.translate(TypeVocabulary::JsonSchema);
                Tool::new(
                    entry.name.as_str().to_string(),
                    entry.description.clone(),
                    Arc::new(schema.to_json_object()),
                )
            })
            .collect()
    }

    fn format_error(&self, error: &ToolError, _call_id: Option<&CallId>) -> McpError {
        error.to_mcp_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NormalizedCall;
    use serde_json::json;

    #[test]
    fn test_parse_call_and_list() {
        let request = McpAdapter
            .parse_request(&json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {"name": "facebook_check_auth"}
            }))
            .unwrap();
        assert_eq!(
            request,
            ProtocolRequest::CallTool(NormalizedCall::new(
                "facebook_check_auth",
                Default::default()
            ))
        );

        assert_eq!(
            McpAdapter.parse_request(&json!({"method": "tools/list"})).unwrap(),
            ProtocolRequest::ListTools
        );
    }

    #[test]
    fn test_parse_rejects_bad_envelopes() {
        for raw in [
            json!({}),
            json!({"method": "resources/list"}),
            json!({"method": "tools/call"}),
            json!({"method": "tools/call", "params": {"arguments": {}}}),
            json!({"method": "tools/call", "params": {"name": "x", "arguments": [1]}}),
        ] {
            let err = McpAdapter.parse_request(&raw).unwrap_err();
            assert_eq!(err.code(), "MALFORMED_REQUEST", "{}", raw);
        }
    }

    #[test]
    fn test_format_carries_text_and_images() {
        let result = ToolResult::content(vec![
            ContentItem::text("summary"),
            ContentItem::image("AAAA", "image/png"),
        ]);
        let value = serde_json::to_value(McpAdapter.format_response(&result, None)).unwrap();
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][0]["text"], "summary");
        assert_eq!(value["content"][1]["type"], "image");
        assert_eq!(value["content"][1]["data"], "AAAA");
        assert_eq!(value["content"][1]["mimeType"], "image/png");
        assert_eq!(value["isError"], false);
    }

    #[test]
    fn test_format_escape_hatches() {
        let text = McpAdapter.format_response(&ToolResult::Text("  raw  ".into()), None);
        let value = serde_json::to_value(&text).unwrap();
        assert_eq!(value["content"][0]["text"], "  raw  ");

        let json_result = ToolResult::Json(json!({"b": 1, "a": [true]}));
        let formatted = McpAdapter.format_response(&json_result, None);
        assert_eq!(formatted.structured_content, Some(json!({"b": 1, "a": [true]})));
        let value = serde_json::to_value(&formatted).unwrap();
        assert_eq!(
            value["content"][0]["text"],
            "{\n  \"a\": [\n    true\n  ],\n  \"b\": 1\n}"
        );
    }

    #[test]
    fn test_error_carries_kind() {
        let err = McpAdapter.format_error(&ToolError::NotAuthenticated, None);
        assert_eq!(err.code.0, -32001);
        assert_eq!(err.data, Some(json!({"code": "NOT_AUTHENTICATED"})));
    }
}
