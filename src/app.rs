//! Process wiring shared by the four server binaries.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::aws::credentials::resolve_client;
use crate::aws::ClientHandle;
use crate::config::{ServerConfig, Transport};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::http;
use crate::mcp_server::StdioServer;
use crate::registry::ToolRegistry;
use crate::service::Service;
use crate::tools;

const DEFAULT_LOG_FILTER: &str = "aws_data_mcp=info";

/// Logs go to stderr; stdout carries the stdio protocol.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Registers every tool of `service` against `client`.
pub fn build(service: Service, client: ClientHandle) -> Result<Dispatcher> {
    let registry = ToolRegistry::new();
    tools::register(service, &registry, client)?;
    tracing::info!(%service, tools = registry.len(), "Registered tools");
    Ok(Dispatcher::new(service, Arc::new(registry)))
}

/// Runs one server process until stdin closes (stdio) or a shutdown signal
/// arrives (HTTP). Credential problems do not stop startup.
pub async fn run(service: Service) -> eyre::Result<()> {
    let config = ServerConfig::from_env(service)?;
    tracing::info!(%service, transport = %config.transport, "Starting {} MCP server", service);

    let client = resolve_client(&config.aws).await;
    if let ClientHandle::NotConfigured(reason) = &client {
        tracing::warn!(%reason, "Starting without a usable AWS client");
    }

    let dispatcher = build(service, client)?;
    match config.transport {
        Transport::Stdio => StdioServer::new(dispatcher).run().await?,
        Transport::Http => http::serve(dispatcher, &config.bind_address()).await?,
    }
    Ok(())
}
