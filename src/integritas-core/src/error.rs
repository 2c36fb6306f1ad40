//! Error types for the adapter.

use thiserror::Error;

/// Errors that can occur while talking to the upstream API or handling
/// tool input.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// The caller supplied input the upstream rejected (HTTP 400) or that
    /// failed local validation.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
    },

    /// Authentication or authorization failure (HTTP 401/403).
    #[error("Authentication failed: {message}")]
    Auth {
        /// Error message.
        message: String,
    },

    /// The upstream is rate limiting us (HTTP 429).
    #[error("Rate limited: {message}")]
    RateLimit {
        /// Error message.
        message: String,
    },

    /// Transient upstream failure (HTTP 5xx, timeouts); retrying later may
    /// succeed.
    #[error("Transient upstream failure: {message}")]
    Transient {
        /// Error message.
        message: String,
    },

    /// Permanent upstream failure; retrying will not help.
    #[error("Upstream request failed: {message}")]
    Permanent {
        /// Error message.
        message: String,
    },

    /// Transport-level failure (connect error, TLS, request aborted).
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// OS keyring error.
    #[error("Keyring error: {message}")]
    Keyring {
        /// Error message.
        message: String,
    },
}

impl AdapterError {
    /// Check whether retrying the operation later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Transport { .. } | Self::RateLimit { .. })
    }
}

/// Build a human-readable message from an upstream response body, falling
/// back to a status-derived description when the body is empty.
pub fn friendly_message(detail: &str, status: Option<u16>) -> String {
    let text = detail.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    match status {
        None => "Upstream request failed (no detail provided)".to_string(),
        Some(408) => "Upstream request timed out".to_string(),
        Some(0) => "Upstream API unreachable".to_string(),
        Some(code) => format!("Upstream request failed with status {code}"),
    }
}

/// Map a non-2xx upstream HTTP status to the adapter error taxonomy.
pub fn map_status(status: u16, detail: &str) -> AdapterError {
    let message = friendly_message(detail, Some(status));
    match status {
        400 => AdapterError::InvalidInput { message },
        401 | 403 => AdapterError::Auth { message },
        429 => AdapterError::RateLimit { message },
        500..=599 => AdapterError::Transient { message },
        _ => AdapterError::Permanent { message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status_taxonomy() {
        assert!(matches!(map_status(400, "bad hash"), AdapterError::InvalidInput { .. }));
        assert!(matches!(map_status(401, ""), AdapterError::Auth { .. }));
        assert!(matches!(map_status(403, ""), AdapterError::Auth { .. }));
        assert!(matches!(map_status(429, ""), AdapterError::RateLimit { .. }));
        assert!(matches!(map_status(500, ""), AdapterError::Transient { .. }));
        assert!(matches!(map_status(503, ""), AdapterError::Transient { .. }));
        assert!(matches!(map_status(404, ""), AdapterError::Permanent { .. }));
    }

    #[test]
    fn test_friendly_message_prefers_body() {
        assert_eq!(friendly_message("  uid not found ", Some(500)), "uid not found");
    }

    #[test]
    fn test_friendly_message_fallbacks() {
        assert_eq!(friendly_message("", Some(408)), "Upstream request timed out");
        assert_eq!(friendly_message("", Some(0)), "Upstream API unreachable");
        assert_eq!(
            friendly_message("", Some(502)),
            "Upstream request failed with status 502"
        );
        assert_eq!(
            friendly_message("", None),
            "Upstream request failed (no detail provided)"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(map_status(503, "").is_transient());
        assert!(map_status(429, "").is_transient());
        assert!(!map_status(400, "").is_transient());
    }
}
