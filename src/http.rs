//! HTTP transport: health, service metadata and the JSON-RPC endpoint.
//!
//! Every JSON-RPC outcome, including malformed bodies, is answered with
//! `200 OK` and a JSON-RPC body.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::protocol::{initialize_result, JsonRpcResponse, JSONRPC_VERSION, SERVER_VERSION};

pub fn router(dispatcher: Dispatcher) -> Router {
    let rpc_path = dispatcher.service().rpc_path();
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route(&rpc_path, get(announce).post(rpc))
        .with_state(dispatcher)
        .layer(TraceLayer::new_for_http())
}

/// GET /health
async fn health_check(State(dispatcher): State<Dispatcher>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": dispatcher.service().server_name(),
        "version": SERVER_VERSION,
        "transport": "http",
        "tools_count": dispatcher.registry().len(),
    }))
}

/// GET /
async fn root(State(dispatcher): State<Dispatcher>) -> Json<Value> {
    let service = dispatcher.service();
    Json(json!({
        "service": format!("{} MCP Server", service),
        "status": "running",
        "transport": "http",
        "endpoints": ["/health", service.rpc_path()],
        "tools_available": dispatcher.registry().names(),
    }))
}

/// GET /mcp/<service>
async fn announce(State(dispatcher): State<Dispatcher>) -> Json<Value> {
    Json(json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": "initialize",
        "result": initialize_result(dispatcher.service()),
    }))
}

/// POST /mcp/<service>
async fn rpc(State(dispatcher): State<Dispatcher>, body: Bytes) -> Json<JsonRpcResponse> {
    Json(dispatcher.handle_body(&body).await)
}

pub async fn serve(dispatcher: Dispatcher, addr: &str) -> Result<()> {
    let service = dispatcher.service();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%service, %addr, path = %service.rpc_path(), "HTTP transport listening");

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(%service, "HTTP transport stopped");
    Ok(())
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
