//! Handler for the `facebook_check_auth` tool.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::facebook::{GraphClient, TokenStatus};
use crate::model::{JsonObject, ToolResult};
use crate::schema::ParametersSchema;
use crate::tools::{ToolFuture, ToolHandler};

pub struct CheckAuthHandler {
    client: Arc<GraphClient>,
}

impl CheckAuthHandler {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Human-readable report for a token status.
pub fn describe_status(status: &TokenStatus, has_fallback: bool) -> String {
    match status {
        TokenStatus::Missing if has_fallback => {
            "Using FACEBOOK_ACCESS_TOKEN from the environment; no token is stored.".to_string()
        }
        TokenStatus::Missing => "Not logged in to Facebook.\n\n\
             Store a token with `facebook-ads-universal store-token <TOKEN>` \
             or set FACEBOOK_ACCESS_TOKEN."
            .to_string(),
        TokenStatus::Expired {
            stored_at,
            expires_at,
        } => format!(
            "Your Facebook token has expired.\n\n\
             Token was stored: {}\nToken expired: {}\n\n\
             Store a new token to keep using the Facebook Ads tools.",
            timestamp(stored_at),
            timestamp(expires_at)
        ),
        TokenStatus::Valid {
            stored_at,
            expires_at,
        } => format!(
            "Authenticated with Facebook.\n\nToken stored: {}\nToken expires: {}",
            timestamp(stored_at),
            expires_at
                .as_ref()
                .map(timestamp)
                .unwrap_or_else(|| "Never".to_string())
        ),
    }
}

impl ToolHandler for CheckAuthHandler {
    fn name(&self) -> &str {
        "facebook_check_auth"
    }

    fn description(&self) -> &str {
        "Check current Facebook authentication status and token validity"
    }

    fn parameters(&self) -> ParametersSchema {
        ParametersSchema::empty()
    }

    fn execute(&self, _args: JsonObject) -> ToolFuture<'_> {
        Box::pin(async move {
            let status = self.client.tokens().info().await?;
            Ok(ToolResult::text(describe_status(
                &status,
                self.client.has_fallback_token(),
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facebook::client_for;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reports_missing_then_valid() {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(client_for("http://127.0.0.1:9", &dir, None));
        let handler = CheckAuthHandler::new(client.clone());

        let text = handler.execute(JsonObject::new()).await.unwrap().joined_text();
        assert!(text.starts_with("Not logged in"));

        client.tokens().store("abc", None).await.unwrap();
        let text = handler.execute(JsonObject::new()).await.unwrap().joined_text();
        assert!(text.starts_with("Authenticated with Facebook."));
        assert!(text.ends_with("Token expires: Never"));
    }

    #[test]
    fn test_expired_report() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let text = describe_status(
            &TokenStatus::Expired {
                stored_at: at,
                expires_at: at,
            },
            false,
        );
        assert!(text.contains("Token expired: 2024-05-01T10:00:00Z"));
    }

    #[test]
    fn test_fallback_token_reported() {
        let text = describe_status(&TokenStatus::Missing, true);
        assert!(text.contains("FACEBOOK_ACCESS_TOKEN"));
    }
}
