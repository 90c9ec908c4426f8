//! Thin Graph API client shared by every tool handler.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::TokenStore;
use crate::config::FacebookConfig;
use crate::error::ToolError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Bytes of a downloaded image plus its MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    fallback_token: Option<String>,
    ad_account_id: Option<String>,
    request_timeout: Duration,
    image_timeout: Duration,
    max_image_bytes: usize,
    tokens: Arc<TokenStore>,
}

impl GraphClient {
    pub fn new(config: &FacebookConfig, tokens: Arc<TokenStore>) -> Result<Self, ToolError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ToolError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.trim_matches('/').to_string(),
            fallback_token: config.access_token.clone(),
            ad_account_id: config.ad_account_id.clone(),
            request_timeout: config.request_timeout,
            image_timeout: config.image_timeout,
            max_image_bytes: config.max_image_bytes,
            tokens,
        })
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Numeric ad account id (without `act_`) used for image hash lookups.
    pub fn ad_account_id(&self) -> Option<&str> {
        self.ad_account_id
            .as_deref()
            .map(|id| id.trim_start_matches("act_"))
            .filter(|id| !id.is_empty())
    }

    /// Whether a token was configured outside the store.
    pub fn has_fallback_token(&self) -> bool {
        self.fallback_token.is_some()
    }

    /// Whether `url` points at the configured Graph API host. Only such URLs
    /// are fetched with the access token attached.
    pub fn is_graph_url(&self, url: &Url) -> bool {
        match Url::parse(&self.base_url) {
            Ok(base) => {
                base.scheme() == url.scheme()
                    && base.host_str() == url.host_str()
                    && base.port_or_known_default() == url.port_or_known_default()
            }
            Err(_) => false,
        }
    }

    /// Stored token first, then the configured fallback.
    pub async fn access_token(&self) -> Result<String, ToolError> {
        if let Some(token) = self.tokens.token().await? {
            return Ok(token);
        }
        self.fallback_token
            .clone()
            .ok_or(ToolError::NotAuthenticated)
    }

    /// `{base}/{version}/{path}` with the query parameters appended.
    pub fn endpoint_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ToolError> {
        let raw = format!(
            "{}/{}/{}",
            self.base_url,
            self.api_version,
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| ToolError::Internal(format!("Invalid Graph API URL {}: {}", raw, e)))?;
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET a Graph API path relative to the configured version.
    pub async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ToolError> {
        let mut url = self.endpoint_url(path, params)?;
        let token = self.access_token().await?;
        url.query_pairs_mut().append_pair("access_token", &token);
        self.get_json(url).await
    }

    /// GET an absolute URL such as a `paging.next` link. The access token is
    /// added only when the link does not already carry one.
    pub async fn get_url(&self, url: &Url) -> Result<Value, ToolError> {
        let mut url = url.clone();
        if !url.query_pairs().any(|(key, _)| key == "access_token") {
            let token = self.access_token().await?;
            url.query_pairs_mut().append_pair("access_token", &token);
        }
        self.get_json(url).await
    }

    async fn get_json(&self, url: Url) -> Result<Value, ToolError> {
        debug!(path = url.path(), "Graph API request");

        let response = self
            .http
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        let parsed = serde_json::from_slice::<Value>(&body).ok();

        if let Some(error) = parsed.as_ref().and_then(|v| v.get("error")) {
            return Err(graph_error(Some(status), error));
        }
        if !status.is_success() {
            return Err(ToolError::UpstreamApi {
                status: Some(status.as_u16()),
                code: None,
                message: format!("HTTP {}", status),
            });
        }

        parsed.ok_or_else(|| ToolError::UpstreamApi {
            status: Some(status.as_u16()),
            code: None,
            message: "Response was not valid JSON".to_string(),
        })
    }

    /// Download an image, refusing anything larger than `max_bytes` (or the
    /// configured cap when `None`).
    pub async fn download_image(
        &self,
        url: &str,
        max_bytes: Option<usize>,
    ) -> Result<DownloadedImage, ToolError> {
        let max_bytes = max_bytes.unwrap_or(self.max_image_bytes);
        let parsed = Url::parse(url).map_err(|e| ToolError::invalid_field("image_url", e))?;

        let mut response = self
            .http
            .get(parsed)
            .timeout(self.image_timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::UpstreamApi {
                status: Some(status.as_u16()),
                code: None,
                message: format!("Image download failed with HTTP {}", status),
            });
        }

        let too_large = || ToolError::UpstreamApi {
            status: Some(status.as_u16()),
            code: None,
            message: format!("Image exceeds {} bytes", max_bytes),
        };
        if response
            .content_length()
            .is_some_and(|len| len > max_bytes as u64)
        {
            return Err(too_large());
        }

        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(map_transport_error)? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(DownloadedImage {
            bytes,
            mime_type: image_mime_type(header_mime.as_deref(), url),
        })
    }
}

/// Prefer an `image/*` content type; otherwise guess from the URL.
pub fn image_mime_type(header: Option<&str>, url: &str) -> String {
    if let Some(mime) = header.filter(|m| m.starts_with("image/")) {
        return mime.to_string();
    }
    let lower = url.to_ascii_lowercase();
    let guessed = if lower.contains(".png") {
        "image/png"
    } else if lower.contains(".gif") {
        "image/gif"
    } else if lower.contains(".webp") {
        "image/webp"
    } else {
        "image/jpeg"
    };
    guessed.to_string()
}

fn graph_error(status: Option<StatusCode>, error: &Value) -> ToolError {
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or("Unknown Graph API error")
        .to_string();

    ToolError::UpstreamApi {
        status: status.map(|s| s.as_u16()),
        code: error.get("code").and_then(Value::as_i64),
        message,
    }
}

fn map_transport_error(err: reqwest::Error) -> ToolError {
    if err.is_timeout() {
        ToolError::Timeout("Facebook API took too long to respond".to_string())
    } else {
        ToolError::UpstreamApi {
            status: err.status().map(|s| s.as_u16()),
            code: None,
            message: format!("API Request failed: {}", err),
        }
    }
}
