//! OpenAI function-calling adapter.
//!
//! Accepts the legacy `function_call` envelope and the newer `tool_calls`
//! array. Only the first tool call is serviced.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::{ProtocolAdapter, call_arguments, tool_name};
use crate::catalog::ToolCatalog;
use crate::error::ToolError;
use crate::model::{NormalizedCall, ProtocolRequest, ToolResult};
use crate::schema::{ParametersSchema, TypeVocabulary};
use crate::types::CallId;

const IMAGES_INTRO: &str = "Here are the retrieved images:";

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiAdapter;

/// A `function` (legacy) or `tool` message carrying the call's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionMessage {
    pub role: &'static str,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Assistant message carrying a call's images as `data:` URLs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMessage {
    pub role: &'static str,
    pub content: Vec<MessagePart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
    pub detail: &'static str,
}

/// Serializes as the bare message, or as a two-element array when the
/// result carried images.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OpenAiResponse {
    Message(FunctionMessage),
    WithImages(FunctionMessage, ImageMessage),
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionDeclaration,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: ParametersSchema,
}

impl ProtocolAdapter for OpenAiAdapter {
    type Response = OpenAiResponse;
    type ToolDefinition = FunctionDefinition;
    type ErrorResponse = FunctionMessage;

    fn name(&self) -> &'static str {
        "openai"
    }

    fn parse_request(&self, raw: &Value) -> Result<ProtocolRequest, ToolError> {
        // SDK messages carry `"function_call": null` next to `tool_calls`
        if let Some(function_call) = raw.get("function_call").filter(|v| v.is_object()) {
            let name = tool_name(function_call.get("name"), "function_call")?;
            let args = call_arguments(function_call.get("arguments"))?;
            return Ok(ProtocolRequest::CallTool(NormalizedCall::new(name, args)));
        }

        if let Some(tool_calls) = raw.get("tool_calls").and_then(Value::as_array)
            && let Some(first) = tool_calls.first()
        {
            if tool_calls.len() > 1 {
                warn!(
                    ignored = tool_calls.len() - 1,
                    "only the first tool call is serviced"
                );
            }
            let function = first.get("function").unwrap_or(&Value::Null);
            let name = tool_name(function.get("name"), "tool call")?;
            let args = call_arguments(function.get("arguments"))?;
            let mut call = NormalizedCall::new(name, args);
            if let Some(id) = first.get("id").and_then(Value::as_str) {
                call = call.with_call_id(id);
            }
            return Ok(ProtocolRequest::CallTool(call));
        }

        Err(ToolError::MalformedRequest(
            "expected function_call or tool_calls".to_string(),
        ))
    }

    fn format_response(&self, result: &ToolResult, call_id: Option<&CallId>) -> OpenAiResponse {
        let message = FunctionMessage {
            role: if call_id.is_some() { "tool" } else { "function" },
            content: result.joined_text(),
            tool_call_id: call_id.map(|id| id.as_str().to_string()),
        };

        let images = result.images();
        if images.is_empty() {
            return OpenAiResponse::Message(message);
        }

        let mut parts = vec![MessagePart::Text {
            text: IMAGES_INTRO.to_string(),
        }];
        parts.extend(images.into_iter().map(|(data, mime_type)| MessagePart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{};base64,{}", mime_type, data),
                detail: "auto",
            },
        }));
        OpenAiResponse::WithImages(
            message,
            ImageMessage {
                role: "assistant",
                content: parts,
            },
        )
    }

    fn tool_definitions(&self, catalog: &ToolCatalog) -> Vec<FunctionDefinition> {
        catalog
            .entries()
            .iter()
            .map(|entry| FunctionDefinition {
                kind: "function",
                function: FunctionDeclaration {
                    name: entry.name.as_str().to_string(),
                    description: entry.description.clone(),
                    parameters: entry.parameters.translate(TypeVocabulary::JsonSchema),
                },
            })
            .collect()
    }

    fn format_error(&self, error: &ToolError, call_id: Option<&CallId>) -> FunctionMessage {
        FunctionMessage {
            role: if call_id.is_some() { "tool" } else { "function" },
            content: format!("Error: {}", error.message()),
            tool_call_id: call_id.map(|id| id.as_str().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentItem;
    use crate::schema::PropertySchema;
    use crate::tools::{ToolFuture, ToolHandler, ToolRegistry};
    use serde_json::json;

    #[test]
    fn test_tool_calls_with_string_arguments() {
        let request = OpenAiAdapter
            .parse_request(&json!({
                "tool_calls": [{"id": "abc", "function": {"name": "x", "arguments": "{\"a\":1}"}}]
            }))
            .unwrap();
        let expected = NormalizedCall::new("x", json!({"a": 1}).as_object().cloned().unwrap())
            .with_call_id("abc");
        assert_eq!(request, ProtocolRequest::CallTool(expected));
    }

    #[test]
    fn test_legacy_function_call_with_object_or_empty_arguments() {
        let request = OpenAiAdapter
            .parse_request(&json!({"function_call": {"name": "y", "arguments": {"b": [1, 2]}}}))
            .unwrap();
        let call = request.into_call().unwrap();
        assert_eq!(call.args["b"], json!([1, 2]));
        assert_eq!(call.call_id, None);

        let request = OpenAiAdapter
            .parse_request(&json!({"function_call": {"name": "y", "arguments": ""}}))
            .unwrap();
        assert!(request.into_call().unwrap().args.is_empty());
    }

    #[test]
    fn test_null_function_call_falls_through_to_tool_calls() {
        let request = OpenAiAdapter
            .parse_request(&json!({
                "role": "assistant",
                "content": null,
                "function_call": null,
                "tool_calls": [{
                    "id": "abc",
                    "type": "function",
                    "function": {"name": "x", "arguments": "{\"a\":1}"}
                }]
            }))
            .unwrap();
        let expected = NormalizedCall::new("x", json!({"a": 1}).as_object().cloned().unwrap())
            .with_call_id("abc");
        assert_eq!(request, ProtocolRequest::CallTool(expected));
    }

    #[test]
    fn test_error_echoes_call_id() {
        let id = CallId::new("call_3");
        let value = serde_json::to_value(
            OpenAiAdapter.format_error(&ToolError::NotAuthenticated, Some(&id)),
        )
        .unwrap();
        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_call_id"], "call_3");

        let legacy =
            serde_json::to_value(OpenAiAdapter.format_error(&ToolError::NotAuthenticated, None))
                .unwrap();
        assert_eq!(legacy["role"], "function");
        assert!(legacy.get("tool_call_id").is_none());
    }

    #[test]
    fn test_extra_tool_calls_are_ignored() {
        let request = OpenAiAdapter
            .parse_request(&json!({
                "tool_calls": [
                    {"id": "1", "function": {"name": "first", "arguments": "{}"}},
                    {"id": "2", "function": {"name": "second", "arguments": "{}"}}
                ]
            }))
            .unwrap();
        assert_eq!(request.into_call().unwrap().tool_name.as_str(), "first");
    }

    #[test]
    fn test_malformed_envelopes() {
        for raw in [
            json!({}),
            json!({"tool_calls": []}),
            json!({"function_call": {"arguments": "{}"}}),
            json!({"function_call": {"name": "x", "arguments": "not json"}}),
        ] {
            assert_eq!(
                OpenAiAdapter.parse_request(&raw).unwrap_err().code(),
                "MALFORMED_REQUEST"
            );
        }
    }

    #[test]
    fn test_response_roles_and_call_id() {
        let result = ToolResult::content(vec![ContentItem::text("a"), ContentItem::text("b")]);

        let legacy = serde_json::to_value(OpenAiAdapter.format_response(&result, None)).unwrap();
        assert_eq!(legacy, json!({"role": "function", "content": "a\nb"}));

        let id = CallId::new("call_9");
        let tool = serde_json::to_value(OpenAiAdapter.format_response(&result, Some(&id))).unwrap();
        assert_eq!(
            tool,
            json!({"role": "tool", "content": "a\nb", "tool_call_id": "call_9"})
        );
    }

    #[test]
    fn test_images_become_second_message() {
        let result = ToolResult::content(vec![
            ContentItem::text("thumbs"),
            ContentItem::image("QUJD", "image/jpeg"),
        ]);
        let value = serde_json::to_value(OpenAiAdapter.format_response(&result, None)).unwrap();
        assert_eq!(value[0]["content"], "thumbs");
        assert_eq!(value[1]["role"], "assistant");
        assert_eq!(value[1]["content"][0]["type"], "text");
        assert_eq!(value[1]["content"][1]["type"], "image_url");
        assert_eq!(
            value[1]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,QUJD"
        );
    }

    #[test]
    fn test_json_result_is_pretty() {
        let result = ToolResult::Json(json!({"z": 1, "a": {"k": "v"}}));
        let OpenAiResponse::Message(message) = OpenAiAdapter.format_response(&result, None) else {
            panic!("expected a single message");
        };
        assert_eq!(message.content, "{\n  \"a\": {\n    \"k\": \"v\"\n  },\n  \"z\": 1\n}");
    }

    struct Nested;

    impl ToolHandler for Nested {
        fn name(&self) -> &str {
            "nested"
        }

        fn description(&self) -> &str {
            ""
        }

        fn parameters(&self) -> ParametersSchema {
            ParametersSchema::default()
                .property(
                    "filter",
                    PropertySchema::object([(
                        "level",
                        PropertySchema::string().one_of(["ad", "account"]),
                    )])
                    .require(["level"]),
                )
                .require(["filter"])
        }

        fn execute(&self, _args: crate::model::JsonObject) -> ToolFuture<'_> {
            Box::pin(async { Ok(ToolResult::text("")) })
        }
    }

    #[test]
    fn test_definition_shape() {
        let catalog = ToolCatalog::from_registry(&ToolRegistry::new().register_handler(Nested));
        let value = serde_json::to_value(OpenAiAdapter.tool_definitions(&catalog)).unwrap();
        assert_eq!(
            value,
            json!([{
                "type": "function",
                "function": {
                    "name": "nested",
                    "description": "Facebook Ads tool",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "filter": {
                                "type": "object",
                                "properties": {
                                    "level": {"type": "string", "enum": ["ad", "account"]}
                                },
                                "required": ["level"]
                            }
                        },
                        "required": ["filter"]
                    }
                }
            }])
        );
    }
}
