//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the wallet
//! layer. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::wallet::types::StellarNetwork;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    /// Default network and endpoint overrides.
    pub network: NetworkSettings,

    /// Session persistence settings.
    pub session: SessionConfig,

    /// XUMM platform credentials and polling.
    pub xumm: XummConfig,

    /// Transaction submission settings.
    pub submission: SubmissionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Network selection.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NetworkSettings {
    /// Network used until a session or the user picks another.
    pub default: StellarNetwork,

    pub testnet: Option<EndpointOverride>,
    pub mainnet: Option<EndpointOverride>,
    pub futurenet: Option<EndpointOverride>,
}

/// Replacement endpoints for one network.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EndpointOverride {
    pub horizon_url: Option<String>,
    pub soroban_rpc_url: Option<String>,
}

/// Session persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding persisted records.
    pub storage_dir: String,

    /// Key the session record is stored under.
    pub key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_dir: ".wallet-link".to_string(),
            key: "stellar-guilds-wallet-session".to_string(),
        }
    }
}

/// XUMM platform API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct XummConfig {
    /// Application API key. Overridden by `WALLET_LINK_XUMM_API_KEY`.
    pub api_key: String,

    /// Application API secret. Overridden by `WALLET_LINK_XUMM_API_SECRET`.
    pub api_secret: String,

    /// Platform API base URL.
    pub api_url: String,

    /// Payload status polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// How long a payload may stay unresolved before it counts as expired.
    pub payload_timeout_secs: u64,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,

    /// Consecutive failed polls tolerated before giving up.
    pub max_poll_failures: u32,
}

impl Default for XummConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            api_url: "https://xumm.app/api/v1/platform".to_string(),
            poll_interval_ms: 2000,
            payload_timeout_secs: 300, // 5 minutes to scan and sign
            request_timeout_secs: 15,
            max_poll_failures: 5,
        }
    }
}

/// Horizon submission configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Total request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
