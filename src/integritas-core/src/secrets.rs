//! API-key storage and resolution.
//!
//! Keys are resolved in a fixed order: per-process memory (set by the
//! `auth_set_api_key` tool), the OS keyring (macOS Keychain, Windows
//! Credential Manager, Linux Secret Service), then static configuration.
//! Key values never appear in logs.

use std::sync::RwLock;

use keyring::Entry;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::AdapterError;

/// Keyring service name for the adapter's credentials.
const SERVICE_NAME: &str = "integritas-mcp";
/// Keyring account under which the API key is stored.
const ACCOUNT: &str = "integritas_api_key";

/// API-key store with in-memory, OS-keyring, and config-backed layers.
pub struct ApiKeyStore {
    memory: RwLock<Option<String>>,
    service: String,
    account: String,
}

impl Default for ApiKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiKeyStore {
    /// Create a store using the adapter's keyring service/account names.
    pub fn new() -> Self {
        Self {
            memory: RwLock::new(None),
            service: SERVICE_NAME.into(),
            account: ACCOUNT.into(),
        }
    }

    /// Store a key in process memory only (cleared on restart).
    pub fn set_memory(&self, key: &str) {
        if let Ok(mut slot) = self.memory.write() {
            *slot = Some(key.to_string());
        }
    }

    /// Clear the in-memory key.
    pub fn clear_memory(&self) {
        if let Ok(mut slot) = self.memory.write() {
            *slot = None;
        }
    }

    /// Persist a key in the OS keyring.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Keyring`] if the keyring is unavailable.
    pub fn save_keyring(&self, key: &str) -> Result<(), AdapterError> {
        let entry = self.entry()?;
        entry.set_password(key).map_err(|e| AdapterError::Keyring {
            message: format!("Failed to store key: {e}"),
        })
    }

    /// Load the key from the OS keyring, if present.
    ///
    /// Keyring failures are treated as "no stored key" so a broken secret
    /// service degrades to the config fallback instead of failing calls.
    pub fn load_keyring(&self) -> Option<String> {
        let entry = self.entry().ok()?;
        match entry.get_password() {
            Ok(key) => Some(key),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "keyring lookup failed");
                None
            },
        }
    }

    /// Remove the key from the OS keyring. Missing entries are not an error.
    pub fn clear_keyring(&self) -> Result<(), AdapterError> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AdapterError::Keyring {
                message: format!("Failed to delete key: {e}"),
            }),
        }
    }

    /// Resolve the effective API key.
    ///
    /// Order: in-memory, OS keyring, then `settings.api_key` (already
    /// populated from the environment at startup).
    pub fn resolve(&self, settings: &Settings) -> Option<String> {
        if let Ok(slot) = self.memory.read() {
            if let Some(ref key) = *slot {
                debug!(source = "memory", "API key resolved");
                return Some(key.clone());
            }
        }

        if let Some(key) = self.load_keyring() {
            debug!(source = "keyring", "API key resolved");
            return Some(key);
        }

        if let Some(ref key) = settings.api_key {
            debug!(source = "config", "API key resolved");
            return Some(key.clone());
        }

        None
    }

    /// Describe where a key would currently be resolved from, without
    /// exposing the key itself.
    pub fn describe(&self, settings: &Settings) -> &'static str {
        if self
            .memory
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
        {
            "memory"
        } else if self.load_keyring().is_some() {
            "keyring"
        } else if settings.api_key.is_some() {
            "config"
        } else {
            "unset"
        }
    }

    fn entry(&self) -> Result<Entry, AdapterError> {
        Entry::new(&self.service, &self.account).map_err(|e| AdapterError::Keyring {
            message: format!("Keyring init failed: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keyring-backed paths need an OS secret service; these tests cover
    // the memory and config layers, which dominate resolution order.

    #[test]
    fn test_memory_key_wins() {
        let store = ApiKeyStore::new();
        store.set_memory("mem-key");
        let settings = Settings {
            api_key: Some("cfg-key".into()),
            ..Settings::default()
        };
        assert_eq!(store.resolve(&settings).as_deref(), Some("mem-key"));
        assert_eq!(store.describe(&settings), "memory");
    }

    #[test]
    fn test_clear_memory_falls_back() {
        let store = ApiKeyStore::new();
        store.set_memory("mem-key");
        store.clear_memory();
        let settings = Settings {
            api_key: Some("cfg-key".into()),
            ..Settings::default()
        };
        // Either keyring (if a leftover entry exists) or config; both are
        // acceptable fallbacks, but memory must be gone.
        let resolved = store.resolve(&settings);
        assert_ne!(resolved.as_deref(), Some("mem-key"));
        assert!(resolved.is_some());
    }

    #[test]
    fn test_unset_everywhere_is_none() {
        let store = ApiKeyStore::new();
        store.clear_memory();
        let settings = Settings::default();
        if store.load_keyring().is_none() {
            assert_eq!(store.resolve(&settings), None);
            assert_eq!(store.describe(&settings), "unset");
        }
    }
}
