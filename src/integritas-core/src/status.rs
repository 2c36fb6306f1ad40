//! Stamp-status service: reconcile a batch of UIDs against the upstream.
//!
//! Thin wrapper that wires the [`PollingReconciler`] to the live upstream
//! client and the system clock, and shapes the result list into the tool
//! envelope.

use tracing::instrument;

use crate::envelope::{
    EnvelopeStatus, ToolResponse, ToolResultEnvelopeV1, STATUS_RESULT_KIND,
};
use crate::reconcile::{PollingReconciler, ReconcileConfig, SystemClock};
use crate::types::UidState;
use crate::upstream::{BoundStatusClient, RequestContext, UpstreamClient};

/// Poll the upstream until every UID is terminal or the round budget is
/// exhausted. Never fails: batch-level failures surface as per-UID errors.
#[instrument(skip(client, ctx, config), fields(uid_count = uids.len()))]
pub async fn perform_stamp_status(
    client: &UpstreamClient,
    uids: &[String],
    config: ReconcileConfig,
    ctx: RequestContext,
) -> Vec<UidState> {
    let backend = BoundStatusClient::new(client, ctx);
    let clock = SystemClock;
    let reconciler = PollingReconciler::new(&backend, &clock, config);
    reconciler.reconcile(uids).await
}

/// Shape a reconciliation result into the tool-result envelope.
pub fn status_response(states: &[UidState], request_id: &str) -> ToolResponse {
    let confirmed = states
        .iter()
        .filter(|s| matches!(s, UidState::Success(_)))
        .count();
    let pending = states.iter().filter(|s| s.is_pending()).count();
    let failed = states
        .iter()
        .filter(|s| matches!(s, UidState::Error { .. }))
        .count();

    let summary = format!("{confirmed} confirmed, {pending} pending, {failed} failed");
    let status = if failed > 0 {
        EnvelopeStatus::Failed
    } else if pending > 0 {
        EnvelopeStatus::Pending
    } else if confirmed > 0 {
        EnvelopeStatus::Finalized
    } else {
        EnvelopeStatus::Unknown
    };

    let mut envelope = ToolResultEnvelopeV1::new(STATUS_RESULT_KIND);
    envelope.status = Some(status);
    envelope.summary = Some(summary.clone());
    envelope.data = serde_json::to_value(states).ok();

    ToolResponse {
        request_id: request_id.to_string(),
        summary: Some(summary),
        structured_content: envelope,
    }
}
