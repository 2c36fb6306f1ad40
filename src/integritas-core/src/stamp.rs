//! Stamp service: submit a content hash for on-chain timestamping.

use serde_json::Value;
use tracing::instrument;

use crate::envelope::{
    EnvelopeStatus, ToolResponse, ToolResultEnvelopeV1, STAMP_RESULT_KIND,
};
use crate::error::AdapterError;
use crate::hash::normalize_hash;
use crate::upstream::{RequestContext, UpstreamClient};

/// Typed receipt for a submitted stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampReceipt {
    /// Correlation UID assigned by the upstream, used for status polling.
    pub uid: Option<String>,
    /// Upstream submission timestamp, if reported.
    pub stamped_at: Option<String>,
    /// Human-readable summary.
    pub summary: String,
}

impl StampReceipt {
    /// Build the tool-result envelope for this receipt.
    pub fn to_response(&self, request_id: &str) -> ToolResponse {
        let mut envelope = ToolResultEnvelopeV1::new(STAMP_RESULT_KIND);
        envelope.status = Some(if self.uid.is_some() {
            EnvelopeStatus::Pending
        } else {
            EnvelopeStatus::Unknown
        });
        envelope.summary = Some(self.summary.clone());
        if let Some(ref uid) = self.uid {
            envelope.ids = Some([("uid".to_string(), uid.clone())].into());
        }
        if let Some(ref ts) = self.stamped_at {
            envelope.timestamps = Some([("stamped_at".to_string(), ts.clone())].into());
        }

        ToolResponse {
            request_id: request_id.to_string(),
            summary: Some(self.summary.clone()),
            structured_content: envelope,
        }
    }
}

/// Parse the upstream stamp payload into a receipt.
///
/// The upstream nests the interesting fields under `data` in newer API
/// revisions and at the top level in older ones; look in both places.
pub fn parse_stamp_payload(payload: &Value) -> StampReceipt {
    let inner = match payload.get("data") {
        Some(data) if data.is_object() => data,
        _ => payload,
    };

    let uid = inner
        .get("uid")
        .and_then(Value::as_str)
        .map(str::to_string);
    let stamped_at = payload
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::to_string);

    let summary = payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| match &uid {
            Some(uid) => format!("Stamp accepted (uid={uid})"),
            None => "Stamp accepted".to_string(),
        });

    StampReceipt {
        uid,
        stamped_at,
        summary,
    }
}

/// Normalize and stamp a caller-supplied hash.
///
/// # Errors
///
/// Returns an error for invalid hash input or an upstream failure; the
/// caller maps these to a failed envelope.
#[instrument(skip(client, ctx))]
pub async fn perform_stamp(
    client: &UpstreamClient,
    raw_hash: &str,
    ctx: &RequestContext,
) -> Result<StampReceipt, AdapterError> {
    let hash_hex = normalize_hash(raw_hash)?;
    let payload = client.stamp_hash(&hash_hex, ctx).await?;
    Ok(parse_stamp_payload(&payload))
}
