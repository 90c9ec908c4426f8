//! Error taxonomy shared by handlers, the dispatcher and every adapter.
//!
//! Each variant carries a stable machine code so that the three protocol
//! error shapes agree on what went wrong:
//!
//! | variant            | code                |
//! |--------------------|---------------------|
//! | `MalformedRequest` | `MALFORMED_REQUEST` |
//! | `Validation`       | `VALIDATION_ERROR`  |
//! | `UnknownTool`      | `UNKNOWN_TOOL`      |
//! | `NotAuthenticated` | `NOT_AUTHENTICATED` |
//! | `UpstreamApi`      | `FACEBOOK_API_ERROR`|
//! | `Timeout`          | `TIMEOUT_ERROR`     |
//! | `Internal`         | `INTERNAL_ERROR`    |

use std::fmt;

use rmcp::model::ErrorCode;
use serde_json::json;

/// Fallback text used whenever an error renders to an empty message.
pub const FALLBACK_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Errors that can occur while servicing a single tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolError {
    /// The protocol envelope could not be located in the request.
    MalformedRequest(String),

    /// Arguments failed schema checks. One message per offending field.
    Validation(Vec<String>),

    /// The dispatcher has no handler registered under this name.
    UnknownTool(String),

    /// No access token is stored or configured.
    NotAuthenticated,

    /// The Graph API answered with an error.
    UpstreamApi {
        /// HTTP status returned by the Graph API, if a response arrived.
        status: Option<u16>,
        /// Graph error code from the `error.code` field.
        code: Option<i64>,
        /// Human-readable message.
        message: String,
    },

    /// The upstream call exceeded its time bound.
    Timeout(String),

    /// Anything unanticipated.
    Internal(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRequest(msg) => write!(f, "Malformed request: {}", msg),
            Self::Validation(errors) => write!(f, "Validation error: {}", errors.join(", ")),
            Self::UnknownTool(name) => write!(f, "Unknown tool: {}", name),
            Self::NotAuthenticated => write!(
                f,
                "Not authenticated: store a token with `store-token` or set FACEBOOK_ACCESS_TOKEN"
            ),
            Self::UpstreamApi {
                code: Some(code),
                message,
                ..
            } => write!(f, "Facebook API Error: {} (Code: {})", message, code),
            Self::UpstreamApi { message, .. } => write!(f, "Facebook API Error: {}", message),
            Self::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            Self::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ToolError {}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}

impl ToolError {
    /// Create a validation error for a single field.
    pub fn invalid_field(field: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Validation(vec![format!("{}: {}", field, message)])
    }

    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "MALFORMED_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UnknownTool(_) => "UNKNOWN_TOOL",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::UpstreamApi { .. } => "FACEBOOK_API_ERROR",
            Self::Timeout(_) => "TIMEOUT_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Human-readable message. Never empty.
    pub fn message(&self) -> String {
        let text = self.to_string();
        if text.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            text
        }
    }

    /// Convert this error to an MCP `ErrorData` for JSON-RPC error responses.
    pub fn to_mcp_error(&self) -> rmcp::ErrorData {
        let data = Some(json!({ "code": self.code() }));
        match self {
            Self::MalformedRequest(_) | Self::Validation(_) | Self::UnknownTool(_) => {
                rmcp::ErrorData::invalid_params(self.message(), data)
            }
            Self::NotAuthenticated => {
                rmcp::ErrorData::new(ErrorCode(-32001), self.message(), data)
            }
            Self::UpstreamApi { .. } | Self::Timeout(_) | Self::Internal(_) => {
                rmcp::ErrorData::internal_error(self.message(), data)
            }
        }
    }
}
