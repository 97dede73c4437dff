//! SEC Filings MCP Server - Entry point
//!
//! Serves the filing tools over stdio. Configuration comes from the environment.

use sec_filings_mcp_server::{run_server_with_config, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the MCP protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sec_filings_mcp_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting SEC Filings MCP Server");

    run_server_with_config(ServerConfig::from_env()).await
}
