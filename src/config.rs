//! Runtime configuration.
//!
//! Every setting can come from a CLI flag or its environment variable; a
//! `.env` file in the working directory is loaded by the binary before
//! parsing.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::facebook::TokenStore;

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v18.0";
pub const DEFAULT_PORT: u16 = 3003;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Which transports to start when no subcommand is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ServerMode {
    /// MCP over stdio only.
    #[default]
    Mcp,
    /// HTTP API only (OpenAI, Gemini, MCP over HTTP).
    Api,
    /// HTTP API plus MCP over stdio.
    Both,
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mcp => "mcp",
            Self::Api => "api",
            Self::Both => "both",
        };
        f.write_str(name)
    }
}

/// Settings for talking to the Graph API.
#[derive(Debug, Clone)]
pub struct FacebookConfig {
    pub base_url: String,
    pub api_version: String,
    /// Fallback token used when the store holds none.
    pub access_token: Option<String>,
    /// Account used to resolve image hashes to URLs.
    pub ad_account_id: Option<String>,
    pub token_path: PathBuf,
    pub request_timeout: Duration,
    pub image_timeout: Duration,
    pub max_image_bytes: usize,
}

impl Default for FacebookConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token: None,
            ad_account_id: None,
            token_path: TokenStore::default_path(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub port: u16,
    pub mode: ServerMode,
    pub facebook: FacebookConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            port: DEFAULT_PORT,
            mode: ServerMode::default(),
            facebook: FacebookConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// Command-line flags shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Port for the HTTP API.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT, global = true)]
    pub port: u16,

    /// Transports to start when no subcommand is given.
    #[arg(long, env = "SERVER_MODE", value_enum, default_value_t = ServerMode::Mcp, global = true)]
    pub mode: ServerMode,

    /// Server name reported to MCP clients.
    #[arg(long, env = "MCP_SERVER_NAME", global = true)]
    pub server_name: Option<String>,

    /// Server version reported to MCP clients.
    #[arg(long, env = "MCP_SERVER_VERSION", global = true)]
    pub server_version: Option<String>,

    #[arg(long, env = "FACEBOOK_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub facebook_base_url: String,

    #[arg(long, env = "FACEBOOK_API_VERSION", default_value = DEFAULT_API_VERSION, global = true)]
    pub facebook_api_version: String,

    /// Used when no token has been stored.
    #[arg(long, env = "FACEBOOK_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub facebook_access_token: Option<String>,

    /// Ad account used to turn creative image hashes into URLs.
    #[arg(long, env = "FACEBOOK_AD_ACCOUNT_ID", global = true)]
    pub facebook_ad_account_id: Option<String>,

    /// Where the access token is stored.
    #[arg(long, env = "FACEBOOK_TOKEN_PATH", global = true)]
    pub token_path: Option<PathBuf>,

    /// Timeout for Graph API requests, in seconds.
    #[arg(long, env = "FACEBOOK_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs(), global = true)]
    pub request_timeout_secs: u64,
}

impl From<ConfigArgs> for ServerConfig {
    fn from(args: ConfigArgs) -> Self {
        let defaults = ServerConfig::default();
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Self {
            name: non_blank(args.server_name).unwrap_or(defaults.name),
            version: non_blank(args.server_version).unwrap_or(defaults.version),
            port: args.port,
            mode: args.mode,
            facebook: FacebookConfig {
                base_url: args.facebook_base_url,
                api_version: args.facebook_api_version,
                access_token: non_blank(args.facebook_access_token),
                ad_account_id: non_blank(args.facebook_ad_account_id),
                token_path: args.token_path.unwrap_or(defaults.facebook.token_path),
                request_timeout: Duration::from_secs(args.request_timeout_secs.max(1)),
                ..defaults.facebook
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from([
            "test",
            "--port",
            "4000",
            "--mode",
            "both",
            "--facebook-api-version",
            "v19.0",
            "--token-path",
            "/tmp/tok.json",
            "--request-timeout-secs",
            "5",
            "--server-name",
            "ads",
        ]);
        let config = ServerConfig::from(cli.config);

        assert_eq!(config.port, 4000);
        assert_eq!(config.mode, ServerMode::Both);
        assert_eq!(config.name, "ads");
        assert_eq!(config.facebook.api_version, "v19.0");
        assert_eq!(config.facebook.token_path, PathBuf::from("/tmp/tok.json"));
        assert_eq!(config.facebook.request_timeout, Duration::from_secs(5));
        assert_eq!(config.facebook.image_timeout, DEFAULT_IMAGE_TIMEOUT);
        assert_eq!(config.bind_addr(), "0.0.0.0:4000");
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(ServerMode::Api.to_string(), "api");
        assert_eq!(ServerMode::default(), ServerMode::Mcp);
    }
}
