//! Per-network passphrases and endpoints.
//!
//! # Responsibilities
//! - Static lookup of passphrase, Horizon URL and Soroban RPC URL
//! - Endpoint overrides from configuration (passphrases are fixed)

use serde::Serialize;

use crate::config::schema::{EndpointOverride, NetworkSettings};
use crate::wallet::types::StellarNetwork;

/// Network the application starts on when nothing else is configured.
pub const DEFAULT_NETWORK: StellarNetwork = StellarNetwork::Testnet;

/// Resolved settings for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    pub network: StellarNetwork,
    pub passphrase: &'static str,
    pub horizon_url: String,
    pub soroban_rpc_url: String,
}

/// Signature-scoping passphrase for a network.
pub fn passphrase(network: StellarNetwork) -> &'static str {
    match network {
        StellarNetwork::Testnet => "Test SDF Network ; September 2015",
        StellarNetwork::Mainnet => "Public Global Stellar Network ; September 2015",
        StellarNetwork::Futurenet => "Test SDF Future Network ; October 2022",
    }
}

fn horizon_url(network: StellarNetwork) -> &'static str {
    match network {
        StellarNetwork::Testnet => "https://horizon-testnet.stellar.org",
        StellarNetwork::Mainnet => "https://horizon.stellar.org",
        StellarNetwork::Futurenet => "https://horizon-futurenet.stellar.org",
    }
}

fn soroban_rpc_url(network: StellarNetwork) -> &'static str {
    match network {
        StellarNetwork::Testnet => "https://soroban-testnet.stellar.org",
        StellarNetwork::Mainnet => "https://soroban-rpc.mainnet.stellar.gateway.fm",
        StellarNetwork::Futurenet => "https://rpc-futurenet.stellar.org",
    }
}

/// Built-in configuration for a network. Pure lookup.
pub fn config_for(network: StellarNetwork) -> NetworkConfig {
    NetworkConfig {
        network,
        passphrase: passphrase(network),
        horizon_url: horizon_url(network).to_string(),
        soroban_rpc_url: soroban_rpc_url(network).to_string(),
    }
}

/// Built-in network table with configured endpoint overrides applied.
#[derive(Debug, Clone, Default)]
pub struct NetworkTable {
    settings: NetworkSettings,
}

impl NetworkTable {
    pub fn new(settings: NetworkSettings) -> Self {
        Self { settings }
    }

    pub fn default_network(&self) -> StellarNetwork {
        self.settings.default
    }

    /// Resolve a network, preferring configured endpoints.
    pub fn resolve(&self, network: StellarNetwork) -> NetworkConfig {
        let mut config = config_for(network);
        if let Some(o) = self.override_for(network) {
            if let Some(url) = &o.horizon_url {
                config.horizon_url = url.trim_end_matches('/').to_string();
            }
            if let Some(url) = &o.soroban_rpc_url {
                config.soroban_rpc_url = url.trim_end_matches('/').to_string();
            }
        }
        config
    }

    fn override_for(&self, network: StellarNetwork) -> Option<&EndpointOverride> {
        match network {
            StellarNetwork::Testnet => self.settings.testnet.as_ref(),
            StellarNetwork::Mainnet => self.settings.mainnet.as_ref(),
            StellarNetwork::Futurenet => self.settings.futurenet.as_ref(),
        }
    }
}
