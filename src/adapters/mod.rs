//! Protocol adapters.
//!
//! Each adapter translates one LLM tool-calling convention into a
//! [`NormalizedCall`] and translates the [`ToolResult`] (or [`ToolError`])
//! back. Adapters hold no state; one instance may serve any number of
//! concurrent requests.

mod gemini;
mod mcp;
mod openai;

pub use gemini::GeminiAdapter;
pub use mcp::McpAdapter;
pub use openai::OpenAiAdapter;

use serde::Serialize;
use serde_json::Value;

use crate::catalog::ToolCatalog;
use crate::error::ToolError;
use crate::model::{JsonObject, NormalizedCall, ProtocolRequest, ToolResult};
use crate::tools::Dispatcher;
use crate::types::CallId;

/// The four-operation contract every protocol implements.
pub trait ProtocolAdapter: Send + Sync {
    /// Successful call result in the protocol's shape.
    type Response: Serialize + Send;
    /// One advertised tool in the protocol's declaration shape.
    type ToolDefinition: Serialize + Send;
    /// Error result in the protocol's shape.
    type ErrorResponse: Serialize + Send;

    /// Short protocol name used in logs.
    fn name(&self) -> &'static str;

    fn parse_request(&self, raw: &Value) -> Result<ProtocolRequest, ToolError>;

    fn format_response(&self, result: &ToolResult, call_id: Option<&CallId>) -> Self::Response;

    /// Tool declarations in catalog order.
    fn tool_definitions(&self, catalog: &ToolCatalog) -> Vec<Self::ToolDefinition>;

    /// Never fails and never produces an empty message. `call_id` is set when
    /// the request parsed far enough to carry one.
    fn format_error(&self, error: &ToolError, call_id: Option<&CallId>) -> Self::ErrorResponse;
}

/// A failed call: the error itself plus its protocol rendering.
#[derive(Debug)]
pub struct Failure<E> {
    pub error: ToolError,
    pub body: E,
}

/// Parse, dispatch and format one raw request.
pub async fn invoke<A: ProtocolAdapter>(
    adapter: &A,
    dispatcher: &Dispatcher,
    raw: &Value,
) -> Result<A::Response, Failure<A::ErrorResponse>> {
    let mut call_id = None;
    let outcome = async {
        let call = adapter
            .parse_request(raw)?
            .into_call()
            .ok_or_else(|| ToolError::MalformedRequest("expected a tool call".to_string()))?;
        call_id = call.call_id.clone();
        dispatcher.dispatch(call).await
    }
    .await;

    match outcome {
        Ok(result) => Ok(adapter.format_response(&result, call_id.as_ref())),
        Err(error) => {
            tracing::debug!(protocol = adapter.name(), code = error.code(), "request failed");
            let body = adapter.format_error(&error, call_id.as_ref());
            Err(Failure { error, body })
        }
    }
}

/// Non-empty tool name from a request envelope.
pub(crate) fn tool_name(value: Option<&Value>, context: &str) -> Result<String, ToolError> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ToolError::MalformedRequest(format!("{} is missing a name", context)))
}

/// Decode call arguments.
///
/// Absent or `null` means no arguments. A string is parsed as JSON, with the
/// empty string meaning `{}`. Whatever arrives must end up an object.
pub(crate) fn call_arguments(value: Option<&Value>) -> Result<JsonObject, ToolError> {
    match value {
        None | Some(Value::Null) => Ok(JsonObject::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(JsonObject::new()),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ToolError::MalformedRequest(
                "arguments must be a JSON object".to_string(),
            )),
            Err(e) => Err(ToolError::MalformedRequest(format!(
                "arguments are not valid JSON: {}",
                e
            ))),
        },
        Some(_) => Err(ToolError::MalformedRequest(
            "arguments must be a JSON object".to_string(),
        )),
    }
}

pub(crate) fn call(name: String, args: JsonObject) -> ProtocolRequest {
    ProtocolRequest::CallTool(NormalizedCall::new(name, args))
}
