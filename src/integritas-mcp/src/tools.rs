//! Tool registry and dispatch.
//!
//! Every MCP tool exposed by the server is declared here with its JSON
//! schema and routed to the matching operation in `integritas-core`.

use std::sync::Arc;

use integritas_core::envelope::generate_request_id;
use integritas_core::error::AdapterError;
use integritas_core::health::check_readiness;
use integritas_core::secrets::ApiKeyStore;
use integritas_core::stamp::perform_stamp;
use integritas_core::status::{perform_stamp_status, status_response};
use integritas_core::upstream::{RequestContext, UpstreamClient};
use integritas_core::verify::perform_verify;
use integritas_core::{ReconcileConfig, Settings};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

/// Shared state handed to every tool invocation.
pub struct ToolContext {
    pub settings: Settings,
    pub client: UpstreamClient,
    pub keys: Arc<ApiKeyStore>,
}

impl ToolContext {
    pub fn new(settings: Settings) -> Result<Self, AdapterError> {
        let client = UpstreamClient::new(&settings)?;
        Ok(Self {
            settings,
            client,
            keys: Arc::new(ApiKeyStore::new()),
        })
    }

    /// Mint a request ID and resolve the API key for one call. A key
    /// supplied in the tool arguments wins over every stored source.
    fn request_context(&self, override_key: Option<String>) -> (String, RequestContext) {
        let request_id = generate_request_id();
        let api_key = override_key.or_else(|| self.keys.resolve(&self.settings));
        let ctx = RequestContext {
            request_id: Some(request_id.clone()),
            api_key,
        };
        (request_id, ctx)
    }
}

/// Tool declarations, as serialized into a `tools/list` reply.
pub fn tool_listing() -> Vec<Value> {
    vec![
        tool_entry(
            "health",
            "Liveness: quick, in-process check (no network).",
            json!({"type": "object", "properties": {}}),
        ),
        tool_entry(
            "ready",
            "Readiness: probes the upstream Integritas API and reports reachability.",
            json!({"type": "object", "properties": {}}),
        ),
        tool_entry(
            "stamp_hash",
            "Submit a content hash to the Integritas timestamping API. \
             Returns a uid; final confirmation requires the stamp_status tool.",
            json!({
                "type": "object",
                "properties": {
                    "hash": {
                        "type": "string",
                        "description": "SHA-256 hex (with/without 0x) or base64. Normalized to lowercase hex."
                    },
                    "api_key": {"type": "string", "description": "Optional per-call API key override."}
                },
                "required": ["hash"]
            }),
        ),
        tool_entry(
            "stamp_status",
            "Poll the blockchain confirmation status for a list of stamp UIDs \
             until each is confirmed, failed, or the round budget is exhausted.",
            json!({
                "type": "object",
                "properties": {
                    "uids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "UIDs returned by stamp_hash."
                    },
                    "api_key": {"type": "string", "description": "Optional per-call API key override."}
                },
                "required": ["uids"]
            }),
        ),
        tool_entry(
            "verify_data",
            "Verify a proof against the Minima blockchain via the Integritas verifier.",
            json!({
                "type": "object",
                "properties": {
                    "proof": {
                        "type": "object",
                        "description": "Proof JSON returned by a confirmed stamp_status entry."
                    },
                    "api_key": {"type": "string", "description": "Optional per-call API key override."}
                },
                "required": ["proof"]
            }),
        ),
        tool_entry(
            "auth_set_api_key",
            "Store the Integritas API key (in-memory, and in the OS keyring when available).",
            json!({
                "type": "object",
                "properties": {
                    "api_key": {"type": "string"},
                    "persist": {"type": "boolean", "description": "Also save to the OS keyring. Default true."}
                },
                "required": ["api_key"]
            }),
        ),
        tool_entry(
            "auth_get_api_key",
            "Report which source the API key currently resolves from. Never returns the key itself.",
            json!({"type": "object", "properties": {}}),
        ),
        tool_entry(
            "auth_clear_api_key",
            "Remove the stored API key from memory and the OS keyring.",
            json!({"type": "object", "properties": {}}),
        ),
    ]
}

fn tool_entry(name: &str, description: &str, schema: Value) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": schema,
    })
}

#[derive(Debug, Deserialize)]
struct StampArgs {
    hash: String,
    #[serde(default)]
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusArgs {
    uids: Vec<String>,
    #[serde(default)]
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyArgs {
    proof: Value,
    #[serde(default)]
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SetKeyArgs {
    api_key: String,
    #[serde(default = "default_persist")]
    persist: bool,
}

fn default_persist() -> bool {
    true
}

/// Dispatches one `tools/call` to its implementation.
///
/// Returns the structured tool result on success. Errors are reported as
/// `AdapterError` so the transport layer can shape them uniformly.
#[instrument(skip(ctx, arguments), fields(tool = name))]
pub async fn call_tool(
    ctx: &ToolContext,
    name: &str,
    arguments: Value,
) -> Result<Value, AdapterError> {
    match name {
        "health" => Ok(json!({
            "status": "ok",
            "server": "Integritas MCP Server",
            "version": env!("CARGO_PKG_VERSION"),
        })),
        "ready" => {
            let (_, ctx_req) = ctx.request_context(None);
            let report = check_readiness(&ctx.client, &ctx_req).await;
            serde_json::to_value(&report).map_err(internal)
        }
        "stamp_hash" => {
            let args: StampArgs = parse_args(arguments)?;
            let (request_id, ctx_req) = ctx.request_context(args.api_key);
            info!(request_id = %request_id, "stamp_hash invoked");
            let receipt = perform_stamp(&ctx.client, &args.hash, &ctx_req).await?;
            serde_json::to_value(receipt.to_response(&request_id)).map_err(internal)
        }
        "stamp_status" => {
            let args: StatusArgs = parse_args(arguments)?;
            if args.uids.is_empty() {
                return Err(AdapterError::InvalidInput {
                    message: "uids must contain at least one entry".to_string(),
                });
            }
            let (request_id, ctx_req) = ctx.request_context(args.api_key);
            info!(request_id = %request_id, uids = args.uids.len(), "stamp_status invoked");
            let config = ReconcileConfig {
                max_rounds: ctx.settings.status_rounds,
                poll_interval: ctx.settings.status_poll_interval,
            };
            let states = perform_stamp_status(&ctx.client, &args.uids, config, ctx_req).await;
            serde_json::to_value(status_response(&states, &request_id)).map_err(internal)
        }
        "verify_data" => {
            let args: VerifyArgs = parse_args(arguments)?;
            let (request_id, ctx_req) = ctx.request_context(args.api_key);
            info!(request_id = %request_id, "verify_data invoked");
            let outcome = perform_verify(&ctx.client, &args.proof, &ctx_req).await?;
            serde_json::to_value(outcome.to_response(&request_id)).map_err(internal)
        }
        "auth_set_api_key" => {
            let args: SetKeyArgs = parse_args(arguments)?;
            if args.api_key.trim().is_empty() {
                return Err(AdapterError::InvalidInput {
                    message: "api_key must not be empty".to_string(),
                });
            }
            ctx.keys.set_memory(&args.api_key);
            let mut persisted = false;
            if args.persist {
                match ctx.keys.save_keyring(&args.api_key) {
                    Ok(()) => persisted = true,
                    Err(e) => warn!(error = %e, "keyring save failed, key held in memory only"),
                }
            }
            Ok(json!({"stored": true, "persisted": persisted}))
        }
        "auth_get_api_key" => {
            let source = ctx.keys.describe(&ctx.settings);
            Ok(json!({"source": source, "configured": source != "unset"}))
        }
        "auth_clear_api_key" => {
            ctx.keys.clear_memory();
            if let Err(e) = ctx.keys.clear_keyring() {
                warn!(error = %e, "keyring clear failed");
            }
            Ok(json!({"cleared": true}))
        }
        other => Err(AdapterError::InvalidInput {
            message: format!("Unknown tool: {other}"),
        }),
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, AdapterError> {
    serde_json::from_value(arguments).map_err(|e| AdapterError::InvalidInput {
        message: format!("Invalid tool arguments: {e}"),
    })
}

fn internal(e: serde_json::Error) -> AdapterError {
    AdapterError::Permanent {
        message: format!("Failed to serialize tool result: {e}"),
    }
}
