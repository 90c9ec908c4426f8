//! Gemini function-calling adapter.

use serde::Serialize;
use serde_json::Value;

use super::{ProtocolAdapter, call, call_arguments, tool_name};
use crate::catalog::ToolCatalog;
use crate::error::ToolError;
use crate::model::{ProtocolRequest, ToolResult};
use crate::schema::{ParametersSchema, TypeVocabulary};
use crate::types::CallId;

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiAdapter;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeminiResponse {
    pub function_response: FunctionResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionResponse {
    pub name: &'static str,
    pub response: ResponseParts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseParts {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: ParametersSchema,
}

impl GeminiResponse {
    fn new(name: &'static str, parts: Vec<Part>) -> Self {
        Self {
            function_response: FunctionResponse {
                name,
                response: ResponseParts { parts },
            },
        }
    }
}

/// `function_call` or its camelCase spelling. A `null` entry is no call.
fn function_call(value: &Value) -> Option<&Value> {
    value
        .get("function_call")
        .filter(|v| v.is_object())
        .or_else(|| value.get("functionCall").filter(|v| v.is_object()))
}

impl ProtocolAdapter for GeminiAdapter {
    type Response = GeminiResponse;
    type ToolDefinition = FunctionDeclaration;
    type ErrorResponse = GeminiResponse;

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn parse_request(&self, raw: &Value) -> Result<ProtocolRequest, ToolError> {
        let found = function_call(raw).or_else(|| {
            raw.get("parts")
                .and_then(Value::as_array)?
                .iter()
                .find_map(function_call)
        });
        let Some(function_call) = found else {
            return Err(ToolError::MalformedRequest(
                "expected function_call or parts[].function_call".to_string(),
            ));
        };

        let name = tool_name(function_call.get("name"), "function_call")?;
        let args = call_arguments(function_call.get("args"))?;
        Ok(call(name, args))
    }

    fn format_response(&self, result: &ToolResult, _call_id: Option<&CallId>) -> GeminiResponse {
        let mut parts = Vec::new();
        let text = result.joined_text();
        if !text.trim().is_empty() {
            parts.push(Part::Text { text });
        }
        parts.extend(result.images().into_iter().map(|(data, mime_type)| {
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: data.to_string(),
                },
            }
        }));
        GeminiResponse::new("function_result", parts)
    }

    fn tool_definitions(&self, catalog: &ToolCatalog) -> Vec<FunctionDeclaration> {
        catalog
            .entries()
            .iter()
            .map(|entry| FunctionDeclaration {
                name: entry.name.as_str().to_string(),
                description: entry.description.clone(),
                parameters: entry.parameters.translate(TypeVocabulary::Gemini),
            })
            .collect()
    }

    fn format_error(&self, error: &ToolError, _call_id: Option<&CallId>) -> GeminiResponse {
        GeminiResponse::new(
            "error",
            vec![Part::Text {
                text: format!("Error: {}", error.message()),
            }],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentItem, NormalizedCall};
    use crate::schema::PropertySchema;
    use crate::tools::{ToolFuture, ToolHandler, ToolRegistry};
    use serde_json::json;

    #[test]
    fn test_parse_function_call() {
        let request = GeminiAdapter
            .parse_request(&json!({"function_call": {"name": "facebook_list_ad_accounts", "args": {}}}))
            .unwrap();
        assert_eq!(
            request,
            ProtocolRequest::CallTool(NormalizedCall::new(
                "facebook_list_ad_accounts",
                Default::default()
            ))
        );
    }

    #[test]
    fn test_first_part_with_call_wins() {
        let request = GeminiAdapter
            .parse_request(&json!({
                "parts": [
                    {"text": "thinking"},
                    {"function_call": {"name": "first", "args": {"n": 1}}},
                    {"function_call": {"name": "second"}}
                ]
            }))
            .unwrap();
        let call = request.into_call().unwrap();
        assert_eq!(call.tool_name.as_str(), "first");
        assert_eq!(call.args["n"], 1);
    }

    #[test]
    fn test_null_calls_are_skipped() {
        let request = GeminiAdapter
            .parse_request(&json!({
                "function_call": null,
                "parts": [
                    {"function_call": null},
                    {"functionCall": null, "function_call": {"name": "x", "args": {}}}
                ]
            }))
            .unwrap();
        assert_eq!(request.into_call().unwrap().tool_name.as_str(), "x");
    }

    #[test]
    fn test_missing_call_is_malformed() {
        for raw in [json!({}), json!({"parts": [{"text": "hi"}]}), json!({"parts": "x"})] {
            assert_eq!(
                GeminiAdapter.parse_request(&raw).unwrap_err().code(),
                "MALFORMED_REQUEST"
            );
        }
    }

    #[test]
    fn test_text_part_first() {
        let result = ToolResult::content(vec![ContentItem::text("hello")]);
        let value = serde_json::to_value(GeminiAdapter.format_response(&result, None)).unwrap();
        assert_eq!(value["function_response"]["name"], "function_result");
        assert_eq!(value["function_response"]["response"]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_images_follow_text_and_blank_text_is_dropped() {
        let result = ToolResult::content(vec![
            ContentItem::image("SU1H", "image/png"),
            ContentItem::text("caption"),
        ]);
        let value = serde_json::to_value(GeminiAdapter.format_response(&result, None)).unwrap();
        let parts = &value["function_response"]["response"]["parts"];
        assert_eq!(parts[0]["text"], "caption");
        assert_eq!(
            parts[1],
            json!({"inline_data": {"mime_type": "image/png", "data": "SU1H"}})
        );

        let images_only = ToolResult::content(vec![
            ContentItem::text("  "),
            ContentItem::image("SU1H", "image/png"),
        ]);
        let value = serde_json::to_value(GeminiAdapter.format_response(&images_only, None)).unwrap();
        let parts = value["function_response"]["response"]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].get("inline_data").is_some());
    }

    #[test]
    fn test_error_shape() {
        let value = serde_json::to_value(
            GeminiAdapter.format_error(&ToolError::UnknownTool("nope".into()), None),
        )
        .unwrap();
        assert_eq!(
            value,
            json!({
                "function_response": {
                    "name": "error",
                    "response": {"parts": [{"text": "Error: Unknown tool: nope"}]}
                }
            })
        );
    }

    struct Typed;

    impl ToolHandler for Typed {
        fn name(&self) -> &str {
            "typed"
        }

        fn description(&self) -> &str {
            "Typed tool"
        }

        fn parameters(&self) -> ParametersSchema {
            ParametersSchema::default()
                .property("ids", PropertySchema::array_of(PropertySchema::string()))
                .property("mode", PropertySchema::string().one_of(["a", "b"]))
                .property("loose", PropertySchema::default())
                .require(["ids"])
                .closed()
        }

        fn execute(&self, _args: crate::model::JsonObject) -> ToolFuture<'_> {
            Box::pin(async { Ok(ToolResult::text("")) })
        }
    }

    #[test]
    fn test_declarations_use_gemini_types() {
        let catalog = ToolCatalog::from_registry(&ToolRegistry::new().register_handler(Typed));
        let value = serde_json::to_value(GeminiAdapter.tool_definitions(&catalog)).unwrap();
        assert_eq!(
            value,
            json!([{
                "name": "typed",
                "description": "Typed tool",
                "parameters": {
                    "type": "OBJECT",
                    "properties": {
                        "ids": {"type": "ARRAY", "items": {"type": "STRING"}},
                        "mode": {"type": "STRING", "enum": ["a", "b"]},
                        "loose": {"type": "STRING"}
                    },
                    "required": ["ids"]
                }
            }])
        );
    }
}
