//! JSON-RPC 2.0 dispatch for the MCP protocol surface.
//!
//! The same dispatcher backs both transports: stdio frames and the HTTP
//! `/mcp` endpoint hand raw JSON here and relay whatever comes back.

use integritas_core::error::AdapterError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::tools::{call_tool, tool_listing, ToolContext};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Parse one raw frame into a JSON-RPC request.
pub fn parse_jsonrpc_request(raw: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| JsonRpcResponse::failure(None, PARSE_ERROR, format!("Parse error: {e}")))?;
    let id = value.get("id").cloned();
    serde_json::from_value(value).map_err(|e| {
        JsonRpcResponse::failure(id, INVALID_REQUEST, format!("Invalid request: {e}"))
    })
}

/// Dispatch one request.
///
/// Returns `None` for notifications (requests without an id), which per
/// JSON-RPC must not be answered.
pub async fn dispatch_jsonrpc(
    ctx: &ToolContext,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    let id = request.id.clone();
    let is_notification = id.is_none();
    debug!(method = %request.method, notification = is_notification, "dispatching request");

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": "integritas-mcp",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        ),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tool_listing() })),
        "tools/call" => handle_tool_call(ctx, id, request.params).await,
        "notifications/initialized" | "notifications/cancelled" => return None,
        other => {
            warn!(method = %other, "method not found");
            JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
        }
    };

    if is_notification {
        None
    } else {
        Some(response)
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

async fn handle_tool_call(ctx: &ToolContext, id: Option<Value>, params: Value) -> JsonRpcResponse {
    let params: ToolCallParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => {
            return JsonRpcResponse::failure(id, INVALID_PARAMS, format!("Invalid params: {e}"));
        }
    };

    let arguments = if params.arguments.is_null() {
        json!({})
    } else {
        params.arguments
    };

    match call_tool(ctx, &params.name, arguments).await {
        Ok(result) => {
            let text = result
                .get("summary")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| result.to_string());
            JsonRpcResponse::success(
                id,
                json!({
                    "content": [{ "type": "text", "text": text }],
                    "structuredContent": result,
                    "isError": false,
                }),
            )
        }
        Err(AdapterError::InvalidInput { message }) => {
            JsonRpcResponse::failure(id, INVALID_PARAMS, message)
        }
        Err(err) => {
            // Upstream and auth failures are tool execution errors, not
            // protocol errors: report them in-band so the client sees the
            // friendly message.
            JsonRpcResponse::success(
                id,
                json!({
                    "content": [{ "type": "text", "text": err.to_string() }],
                    "isError": true,
                }),
            )
        }
    }
}
