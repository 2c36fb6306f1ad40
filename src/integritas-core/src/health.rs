//! Readiness probe against the upstream health endpoint.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AdapterError;
use crate::upstream::{RequestContext, UpstreamClient};

/// Coarse upstream health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Upstream reachable and answering 2xx.
    Ok,
    /// Upstream reachable but answering non-2xx.
    Degraded,
    /// Upstream unreachable or not configured.
    Down,
}

/// Readiness probe result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Coarse status.
    pub status: HealthStatus,
    /// Server name.
    pub server: String,
    /// Adapter version.
    pub version: String,
    /// Probe time, ISO-8601 UTC.
    pub time_utc: String,
    /// Whether the upstream answered at all.
    pub upstream_reachable: bool,
    /// HTTP status from the upstream, if reachable.
    pub upstream_status: Option<u16>,
    /// Observed round-trip latency in milliseconds, if reachable.
    pub upstream_latency_ms: Option<u64>,
    /// Human-readable summary.
    pub summary: String,
}

impl HealthReport {
    fn base(status: HealthStatus, summary: String) -> Self {
        Self {
            status,
            server: "Integritas MCP Server".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            time_utc: crate::envelope::utc_iso(),
            upstream_reachable: false,
            upstream_status: None,
            upstream_latency_ms: None,
            summary,
        }
    }
}

/// Probe upstream readiness.
///
/// Never fails: probe errors are folded into a `Down` report.
#[instrument(skip(client, ctx))]
pub async fn check_readiness(client: &UpstreamClient, ctx: &RequestContext) -> HealthReport {
    match client.health_probe(ctx).await {
        Ok((code, latency)) => {
            let mut report = if (200..300).contains(&code) {
                HealthReport::base(HealthStatus::Ok, "Ready".into())
            } else {
                HealthReport::base(
                    HealthStatus::Degraded,
                    format!("Upstream returned {code}"),
                )
            };
            report.upstream_reachable = true;
            report.upstream_status = Some(code);
            report.upstream_latency_ms = Some(latency.as_millis() as u64);
            report
        },
        Err(AdapterError::Config { message }) => HealthReport::base(HealthStatus::Down, message),
        Err(e) => HealthReport::base(HealthStatus::Down, format!("Upstream error: {e}")),
    }
}
