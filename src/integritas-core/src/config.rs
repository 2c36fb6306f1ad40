//! Configuration for the adapter.

use std::time::Duration;

/// Configuration for the Integritas adapter.
///
/// Built once at startup (typically via [`Settings::from_env`]) and passed
/// explicitly to the components that need it. Services never read ambient
/// environment state at call time.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the upstream timestamping API.
    pub api_base: String,
    /// Upstream API key from configuration, if any. Key resolution order is
    /// handled by [`crate::secrets::ApiKeyStore`].
    pub api_key: Option<String>,
    /// Upstream health endpoint URL. `None` disables the readiness probe.
    pub health_url: Option<String>,
    /// Total per-request timeout.
    pub request_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Maximum number of status polling rounds before still-pending UIDs
    /// are returned as Pending.
    pub status_rounds: u32,
    /// Fixed delay between status polling rounds.
    pub status_poll_interval: Duration,
    /// Bearer token required on the HTTP transport. `None` disables auth.
    pub http_bearer_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "https://api.integritas.minima.global".into(),
            api_key: None,
            health_url: Some("https://api.integritas.minima.global/health".into()),
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            status_rounds: 6,
            status_poll_interval: Duration::from_secs(5),
            http_bearer_token: None,
        }
    }
}

impl Settings {
    /// Build settings from `INTEGRITAS_*` environment variables, with
    /// defaults for everything not set.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(base) = std::env::var("INTEGRITAS_API_BASE") {
            if !base.trim().is_empty() {
                settings.api_base = base.trim_end_matches('/').to_string();
                settings.health_url = Some(format!("{}/health", settings.api_base));
            }
        }
        if let Ok(key) = std::env::var("INTEGRITAS_API_KEY") {
            if !key.is_empty() {
                settings.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("INTEGRITAS_HEALTH_URL") {
            settings.health_url = if url.is_empty() { None } else { Some(url) };
        }
        if let Some(secs) = env_u64("INTEGRITAS_REQUEST_TIMEOUT_SECONDS") {
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Some(rounds) = env_u64("INTEGRITAS_STATUS_ROUNDS") {
            settings.status_rounds = rounds.max(1) as u32;
        }
        if let Some(secs) = env_u64("INTEGRITAS_STATUS_POLL_SECONDS") {
            settings.status_poll_interval = Duration::from_secs(secs);
        }
        if let Ok(token) = std::env::var("INTEGRITAS_HTTP_BEARER_TOKEN") {
            if !token.is_empty() {
                settings.http_bearer_token = Some(token);
            }
        }

        settings
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
