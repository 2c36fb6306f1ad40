//! HTTP transport: the `/mcp` JSON-RPC endpoint plus a small REST surface.
//!
//! `/healthz` is always unauthenticated. When a bearer token is
//! configured, every other route requires `Authorization: Bearer <token>`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use integritas_core::envelope::generate_request_id;
use integritas_core::status::{perform_stamp_status, status_response};
use integritas_core::upstream::RequestContext;
use integritas_core::ReconcileConfig;
use serde::Deserialize;
use serde_json::json;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::dispatcher::{dispatch_jsonrpc, parse_jsonrpc_request};
use crate::tools::ToolContext;

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct HttpState {
    pub ctx: Arc<ToolContext>,
    pub bearer_token: Option<String>,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/mcp", post(mcp_endpoint))
        .route("/v1/timestamp/status", post(timestamp_status))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: HttpState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

pub async fn bind_listener(host: &str, port: u16) -> Result<tokio::net::TcpListener, std::io::Error> {
    let addr: SocketAddr = format!("{host}:{port}").parse().map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid listen address")
    })?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http transport listening");
    Ok(listener)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "server": "Integritas MCP Server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn mcp_endpoint(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    if let Err(status) = authorize(&headers, &state) {
        return (status, Json(json!({"error": "unauthorized"}))).into_response();
    }

    let response = match parse_jsonrpc_request(&body) {
        Ok(request) => dispatch_jsonrpc(&state.ctx, request).await,
        Err(error_response) => Some(error_response),
    };

    match response {
        Some(r) => (StatusCode::OK, Json(r)).into_response(),
        // Notification: acknowledge with an empty body.
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Request body for the REST convenience route.
#[derive(Debug, Deserialize)]
struct TimestampStatusRequest {
    uids: Vec<String>,
    #[serde(default)]
    api_key: Option<String>,
}

/// REST shortcut around the stamp_status tool for clients that do not
/// speak MCP.
async fn timestamp_status(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    if let Err(status) = authorize(&headers, &state) {
        return (status, Json(json!({"error": "unauthorized"}))).into_response();
    }

    let req: TimestampStatusRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("invalid request body: {e}")})),
            )
                .into_response();
        }
    };
    if req.uids.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "uids must contain at least one entry"})),
        )
            .into_response();
    }

    let ctx = &state.ctx;
    let request_id = generate_request_id();
    let api_key = req
        .api_key
        .or_else(|| ctx.keys.resolve(&ctx.settings));
    let ctx_req = RequestContext {
        request_id: Some(request_id.clone()),
        api_key,
    };
    let config = ReconcileConfig {
        max_rounds: ctx.settings.status_rounds,
        poll_interval: ctx.settings.status_poll_interval,
    };
    let states = perform_stamp_status(&ctx.client, &req.uids, config, ctx_req).await;
    (
        StatusCode::OK,
        Json(serde_json::json!(status_response(&states, &request_id))),
    )
        .into_response()
}

fn authorize(headers: &HeaderMap, state: &HttpState) -> Result<(), StatusCode> {
    let Some(token) = state.bearer_token.as_ref() else {
        return Ok(());
    };
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    let parsed = value.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
    let expected = format!("Bearer {token}");
    if parsed != expected {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(())
}
