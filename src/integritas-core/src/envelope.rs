//! Versioned tool-result envelope shared by all tools.
//!
//! Every tool response carries a plain-text `summary` for the transcript
//! and a `structured_content` envelope for programmatic consumers; the
//! transports serialize this container unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope kind for stamp results.
pub const STAMP_RESULT_KIND: &str = "integritas/stamp_result@v1";
/// Envelope kind for stamp-status results.
pub const STATUS_RESULT_KIND: &str = "integritas/stamp_status_result@v1";
/// Envelope kind for verify results.
pub const VERIFY_RESULT_KIND: &str = "integritas/verify_result@v1";
/// Schema URI advertised in every envelope.
pub const SCHEMA_URI: &str = "https://integritas.dev/schemas/tool-result-v1.json";

/// Coarse outcome of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    /// The operation completed and is confirmed.
    Finalized,
    /// The operation was accepted but is not yet confirmed.
    Pending,
    /// The operation failed.
    Failed,
    /// The outcome could not be determined.
    Unknown,
}

/// Renderable hyperlink (clients render an anchor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolLink {
    /// Link relation, e.g. "proof" or "verification".
    pub rel: String,
    /// Target URL.
    pub href: String,
    /// Optional display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Versioned, provider-agnostic tool result container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultEnvelopeV1 {
    /// Envelope kind, e.g. `integritas/stamp_result@v1`.
    pub kind: String,
    /// Coarse outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EnvelopeStatus>,
    /// Human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Identifiers, e.g. `{"uid": "0x..."}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<BTreeMap<String, String>>,
    /// ISO-8601 UTC timestamps keyed by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<BTreeMap<String, String>>,
    /// Links for the client to render.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<ToolLink>>,
    /// Raw domain payload for copy/export.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error detail `{ code?, message, details? }`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Schema URI for this envelope version.
    #[serde(rename = "$schema")]
    pub schema_uri: String,
}

impl ToolResultEnvelopeV1 {
    /// Start an envelope of the given kind with the schema URI filled in.
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            status: None,
            summary: None,
            ids: None,
            timestamps: None,
            links: None,
            data: None,
            error: None,
            schema_uri: SCHEMA_URI.to_string(),
        }
    }
}

/// Standard tool response returned by all tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Correlation ID for this tool call.
    #[serde(rename = "requestId")]
    pub request_id: String,
    /// Plain human-readable text for the chat transcript.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// The versioned envelope.
    #[serde(rename = "structuredContent")]
    pub structured_content: ToolResultEnvelopeV1,
}

/// Current time as ISO-8601 UTC with a `Z` suffix.
pub fn utc_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Generate a unique request ID.
pub fn generate_request_id() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let id: u64 = rng.gen();
    format!("req-{id:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_serializes_skipping_empty_fields() {
        let envelope = ToolResultEnvelopeV1::new(STAMP_RESULT_KIND);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["kind"], STAMP_RESULT_KIND);
        assert_eq!(json["$schema"], SCHEMA_URI);
        assert!(json.get("status").is_none());
        assert!(json.get("ids").is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EnvelopeStatus::Finalized).unwrap(),
            "\"finalized\""
        );
        assert_eq!(
            serde_json::to_string(&EnvelopeStatus::Pending).unwrap(),
            "\"pending\""
        );
    }

    #[test]
    fn test_tool_response_field_names() {
        let response = ToolResponse {
            request_id: "req-1".into(),
            summary: Some("ok".into()),
            structured_content: ToolResultEnvelopeV1::new(VERIFY_RESULT_KIND),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["requestId"], "req-1");
        assert!(json.get("structuredContent").is_some());
    }

    #[test]
    fn test_request_id_format() {
        let id = generate_request_id();
        assert!(id.starts_with("req-"));
        assert_eq!(id.len(), 4 + 16);
    }

    #[test]
    fn test_utc_iso_has_z_suffix() {
        assert!(utc_iso().ends_with('Z'));
    }
}
