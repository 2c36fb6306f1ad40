//! Verify service: check a proof JSON against the upstream verifier.

use serde_json::Value;
use tracing::instrument;

use crate::envelope::{
    EnvelopeStatus, ToolLink, ToolResponse, ToolResultEnvelopeV1, VERIFY_RESULT_KIND,
};
use crate::error::AdapterError;
use crate::upstream::{RequestContext, UpstreamClient};

/// Typed outcome of a proof verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// Whether the proof verified successfully.
    pub valid: bool,
    /// Link to the upstream verification report, if provided.
    pub verification_url: Option<String>,
    /// Human-readable summary.
    pub summary: String,
}

impl VerifyOutcome {
    /// Build the tool-result envelope for this outcome.
    pub fn to_response(&self, request_id: &str) -> ToolResponse {
        let mut envelope = ToolResultEnvelopeV1::new(VERIFY_RESULT_KIND);
        envelope.status = Some(if self.valid {
            EnvelopeStatus::Finalized
        } else {
            EnvelopeStatus::Failed
        });
        envelope.summary = Some(self.summary.clone());
        if let Some(ref url) = self.verification_url {
            envelope.links = Some(vec![ToolLink {
                rel: "verification".into(),
                href: url.clone(),
                label: Some("Verification report".into()),
            }]);
        }

        ToolResponse {
            request_id: request_id.to_string(),
            summary: Some(self.summary.clone()),
            structured_content: envelope,
        }
    }
}

/// Parse the upstream verify payload into a typed outcome.
pub fn parse_verify_payload(payload: &Value) -> VerifyOutcome {
    let data = payload.get("data").unwrap_or(payload);

    let valid = data
        .get("valid")
        .and_then(Value::as_bool)
        .or_else(|| {
            payload
                .get("status")
                .and_then(Value::as_str)
                .map(|s| s.eq_ignore_ascii_case("success"))
        })
        .unwrap_or(false);

    let verification_url = data
        .get("file")
        .and_then(|f| f.get("download_url"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let summary = payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            if valid {
                "Proof verified on chain".to_string()
            } else {
                "Proof could not be verified".to_string()
            }
        });

    VerifyOutcome {
        valid,
        verification_url,
        summary,
    }
}

/// Submit a proof JSON for verification.
///
/// # Errors
///
/// Returns an error if the upstream call fails; a proof the upstream
/// rejects as invalid is an `Ok` outcome with `valid == false`.
#[instrument(skip(client, proof, ctx))]
pub async fn perform_verify(
    client: &UpstreamClient,
    proof: &Value,
    ctx: &RequestContext,
) -> Result<VerifyOutcome, AdapterError> {
    let payload = client.verify_proof(proof, ctx).await?;
    Ok(parse_verify_payload(&payload))
}
