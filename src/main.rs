use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use slack_mcp_http::config::Config;
use slack_mcp_http::mcp::{McpServer, RequestHandler, http};
use slack_mcp_http::slack::SlackClient;
use slack_mcp_http::tools::{Pipeline, SafeSearchPolicy};

#[derive(Debug, Parser)]
#[command(name = "slack-mcp-http", version, about = "Slack MCP server over streamable HTTP")]
struct Cli {
    /// Optional configuration file (TOML, YAML or JSON)
    config: Option<String>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_logging()?;

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).inspect_err(|e| {
        error!("Failed to load configuration: {}", e);
    })?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    info!(slack = ?config.slack, "Configuration loaded");

    let slack_client = Arc::new(SlackClient::new(&config)?);
    let pipeline = Pipeline::new(slack_client, SafeSearchPolicy::new(config.slack.safe_search));
    let server = McpServer::new(RequestHandler::new(pipeline));

    http::serve(server, &config.server).await
}

fn init_logging() -> Result<()> {
    // Support both LOG_LEVEL and RUST_LOG environment variables
    let filter = if let Ok(rust_log) = std::env::var("RUST_LOG") {
        // Use RUST_LOG if set (allows module-specific logging)
        EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new("warn"))
    } else if let Ok(log_level) = std::env::var("LOG_LEVEL") {
        let level_str = match log_level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" | "warning" => "warn",
            "error" => "error",
            _ => "warn",
        };
        EnvFilter::new(level_str)
    } else {
        EnvFilter::new("warn")
    };

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if json {
        builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .try_init()
    } else {
        builder.compact().with_target(false).try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}
