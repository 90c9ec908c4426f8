use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{CallId, ToolName};

/// JSON object carried as tool arguments.
pub type JsonObject = Map<String, Value>;

// The adapter-independent call shape. Every adapter's `parse_request`
// produces one; only the dispatcher consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCall {
    pub tool_name: ToolName,
    pub args: JsonObject,
    /// Present only for protocols that correlate results to a specific
    /// invocation (OpenAI `tool_calls`).
    pub call_id: Option<CallId>,
}

impl NormalizedCall {
    pub fn new(tool_name: impl Into<ToolName>, args: JsonObject) -> Self {
        Self {
            tool_name: tool_name.into(),
            args,
            call_id: None,
        }
    }

    pub fn with_call_id(mut self, call_id: impl Into<CallId>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }
}

/// What a parsed request asks the server to do.
///
/// Only the MCP adapter produces `ListTools`; the vendor adapters serve tool
/// definitions from a dedicated GET endpoint instead.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolRequest {
    ListTools,
    CallTool(NormalizedCall),
}

impl ProtocolRequest {
    /// The call, if this request is a tool invocation.
    pub fn into_call(self) -> Option<NormalizedCall> {
        match self {
            Self::CallTool(call) => Some(call),
            Self::ListTools => None,
        }
    }
}

// One unit of tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text {
        text: String,
    },
    Image {
        /// Base64-encoded bytes.
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::Image {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Raw output of a tool handler. Created by the handler, read-only to adapters.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    /// Ordered content items, the normal shape. Failures are never a
    /// `ToolResult`; they travel as `ToolError`.
    Content(Vec<ContentItem>),
    /// Plain string, passed through verbatim.
    Text(String),
    /// Arbitrary JSON, rendered with 2-space indentation.
    Json(Value),
}

impl ToolResult {
    /// A successful result with a single text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Content(vec![ContentItem::text(text)])
    }

    /// A successful result from a list of content items.
    pub fn content(content: Vec<ContentItem>) -> Self {
        Self::Content(content)
    }

    /// A text item holding pretty-printed JSON, the shape most Graph tools return.
    pub fn pretty_json(value: &Value) -> Self {
        Self::text(render_json(value))
    }

    /// All text carried by the result: text items joined by `\n` in order,
    /// the string verbatim, or the JSON rendered with 2-space indentation.
    pub fn joined_text(&self) -> String {
        match self {
            Self::Content(content) => content
                .iter()
                .filter_map(|item| match item {
                    ContentItem::Text { text } => Some(text.as_str()),
                    ContentItem::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Text(text) => text.clone(),
            Self::Json(value) => render_json(value),
        }
    }

    /// Image items, in order, as `(data, mime_type)` pairs.
    pub fn images(&self) -> Vec<(&str, &str)> {
        match self {
            Self::Content(content) => content
                .iter()
                .filter_map(|item| match item {
                    ContentItem::Image { data, mime_type } => {
                        Some((data.as_str(), mime_type.as_str()))
                    }
                    ContentItem::Text { .. } => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Deterministic 2-space JSON rendering.
pub fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
