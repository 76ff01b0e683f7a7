//! Streamable HTTP transport: one JSON-RPC message per `POST /mcp/`,
//! answered with a single JSON body.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Duration;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;

use super::server::{McpServer, SERVER_NAME};

pub fn router(server: McpServer, config: &ServerConfig) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http.request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/mcp", post(handle_mcp))
        .route("/mcp/", post(handle_mcp))
        .with_state(server)
        .layer(GlobalConcurrencyLimitLayer::new(config.max_in_flight))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_seconds),
        ))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

pub async fn serve(server: McpServer, config: &ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            anyhow::anyhow!("invalid listen address {}:{}: {}", config.host, config.port, e)
        })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", addr, e))?;

    info!(%addr, "Slack MCP server listening");
    axum::serve(listener, router(server, config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to await ctrl-c signal");
        std::future::pending::<()>().await;
    }
    tracing::warn!("received ctrl-c; beginning graceful shutdown");
}

async fn handle_mcp(State(server): State<McpServer>, body: String) -> Response {
    match server.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": SERVER_NAME,
    }))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Slack MCP Server is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
