use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use facebook_ads_universal::tools::describe_status;
use facebook_ads_universal::{
    AppContext, ConfigArgs, GeminiAdapter, McpAdapter, OpenAiAdapter, ProtocolAdapter,
    ServerConfig, ServerMode, api, server,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facebook-ads-universal", version)]
#[command(about = "Facebook Ads tools for MCP, OpenAI and Gemini function calling")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Without a subcommand, `--mode` / SERVER_MODE decides what runs.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as an MCP stdio server (for use in mcp.json)
    McpStdio,
    /// Run the HTTP API (OpenAI, Gemini and MCP over HTTP)
    Api,
    /// Run the HTTP API and the MCP stdio server together
    Serve,
    /// List the available tools
    Tools,
    /// Print tool definitions in a protocol's format
    Definitions {
        #[arg(long, value_enum, default_value_t = Protocol::Mcp)]
        protocol: Protocol,
    },
    /// Store a Facebook access token for later calls
    StoreToken {
        token: String,
        /// Days until the token should be treated as expired
        #[arg(long)]
        expires_in_days: Option<u64>,
    },
    /// Remove the stored access token
    ClearToken,
    /// Show whether a usable token is available
    AuthStatus,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Protocol {
    Mcp,
    Openai,
    Gemini,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries MCP frames, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("facebook_ads_universal=info".parse()?)
                .add_directive("rmcp=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::from(cli.config);
    let context = AppContext::new(config)?;

    let command = cli.command.unwrap_or(match context.config.mode {
        ServerMode::Mcp => Commands::McpStdio,
        ServerMode::Api => Commands::Api,
        ServerMode::Both => Commands::Serve,
    });

    match command {
        Commands::McpStdio => {
            server::serve_stdio(context.mcp_server()).await?;
        }
        Commands::Api => {
            let bind = context.config.bind_addr();
            server::start_http(context.mcp_server(), context.app_state(), &bind).await?;
        }
        Commands::Serve => {
            let bind = context.config.bind_addr();
            info!("Starting HTTP API on {} and MCP on stdio", bind);
            tokio::select! {
                result = server::start_http(context.mcp_server(), context.app_state(), &bind) => result?,
                result = server::serve_stdio(context.mcp_server()) => result?,
            }
        }
        Commands::Tools => {
            println!("{} tools:", context.catalog.len());
            for summary in context.catalog.summaries() {
                println!("  {}: {}", summary.name, summary.description);
            }
        }
        Commands::Definitions { protocol } => {
            let catalog = &context.catalog;
            let rendered = match protocol {
                Protocol::Mcp => serde_json::to_string_pretty(&serde_json::json!({
                    "tools": McpAdapter.tool_definitions(catalog)
                }))?,
                Protocol::Openai => serde_json::to_string_pretty(&api::Definitions {
                    functions: OpenAiAdapter.tool_definitions(catalog),
                })?,
                Protocol::Gemini => serde_json::to_string_pretty(&api::Definitions {
                    functions: GeminiAdapter.tool_definitions(catalog),
                })?,
            };
            println!("{}", rendered);
        }
        Commands::StoreToken {
            token,
            expires_in_days,
        } => {
            let ttl = expires_in_days
                .map(|days| Duration::from_secs(days.saturating_mul(24 * 60 * 60)));
            let stored = context.tokens().store(&token, ttl).await?;
            println!("Token stored at {}", context.tokens().path().display());
            if let Some(expires_at) = stored.expires_at {
                println!("Expires: {}", expires_at.to_rfc3339());
            }
        }
        Commands::ClearToken => {
            if context.tokens().clear().await? {
                println!("Stored token removed.");
            } else {
                println!("No token was stored.");
            }
        }
        Commands::AuthStatus => {
            let status = context.tokens().info().await?;
            println!(
                "{}",
                describe_status(&status, context.client.has_fallback_token())
            );
        }
    }

    Ok(())
}
