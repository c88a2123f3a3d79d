//! Session persistence.
//!
//! Persistence is best-effort: every storage failure is logged and swallowed
//! so an unavailable backend degrades to a non-persistent session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::observability::metrics;
use crate::wallet::storage::KeyValueStorage;
use crate::wallet::transaction::shorten_address;
use crate::wallet::types::{StellarNetwork, WalletProvider};

/// Default storage key for the session record.
pub const SESSION_STORAGE_KEY: &str = "stellar-guilds-wallet-session";

/// The last active (provider, account, network) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    pub provider: WalletProvider,
    pub public_key: String,
    pub network: StellarNetwork,
    /// Time of the last successful connection.
    pub connected_at: DateTime<Utc>,
}

/// Reads and writes the single session record.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_key(storage, SESSION_STORAGE_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrite the record with the given triple, stamped now.
    pub fn save(&self, provider: WalletProvider, public_key: &str, network: StellarNetwork) {
        let session = WalletSession {
            provider,
            public_key: public_key.to_string(),
            network,
            connected_at: Utc::now(),
        };

        let raw = match serde_json::to_string(&session) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize wallet session");
                metrics::record_session_failure("save");
                return;
            }
        };

        match self.storage.set(&self.key, &raw) {
            Ok(()) => tracing::debug!(
                provider = %provider,
                public_key = %shorten_address(public_key, 4),
                network = %network,
                "Wallet session saved"
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to persist wallet session");
                metrics::record_session_failure("save");
            }
        }
    }

    /// The stored record, or `None` when missing, unreadable or malformed.
    pub fn load(&self) -> Option<WalletSession> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(error = %e, "Wallet session unreadable");
                metrics::record_session_failure("load");
                return None;
            }
        };

        match serde_json::from_str::<WalletSession>(&raw) {
            Ok(session) if !session.public_key.is_empty() => Some(session),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed wallet session");
                None
            }
        }
    }

    /// Move the stored record to `network`, keeping its provider and key.
    /// Returns the rewritten record, or `None` when nothing is stored.
    pub fn set_network(&self, network: StellarNetwork) -> Option<WalletSession> {
        let session = self.load()?;
        self.save(session.provider, &session.public_key, network);
        self.load()
    }

    /// Remove the record. Idempotent.
    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(&self.key) {
            tracing::warn!(error = %e, "Failed to clear wallet session");
            metrics::record_session_failure("clear");
        }
    }

    pub fn exists(&self) -> bool {
        self.load().is_some()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("key", &self.key).finish()
    }
}
