//! Wallet domain types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifies which wallet implementation backs an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletProvider {
    /// Freighter browser extension.
    Freighter,
    /// XUMM mobile wallet (QR / deep-link sign-in).
    Xumm,
}

impl WalletProvider {
    /// Every known provider, in declaration order.
    pub const ALL: [WalletProvider; 2] = [WalletProvider::Freighter, WalletProvider::Xumm];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletProvider::Freighter => "freighter",
            WalletProvider::Xumm => "xumm",
        }
    }
}

impl fmt::Display for WalletProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalletProvider {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WalletProvider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| WalletError::UnknownProvider(s.to_string()))
    }
}

/// Stellar network a wallet signs for and submits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StellarNetwork {
    #[default]
    Testnet,
    Mainnet,
    Futurenet,
}

impl StellarNetwork {
    pub const ALL: [StellarNetwork; 3] = [
        StellarNetwork::Testnet,
        StellarNetwork::Mainnet,
        StellarNetwork::Futurenet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StellarNetwork::Testnet => "testnet",
            StellarNetwork::Mainnet => "mainnet",
            StellarNetwork::Futurenet => "futurenet",
        }
    }
}

impl fmt::Display for StellarNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StellarNetwork {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StellarNetwork::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| WalletError::UnknownNetwork(s.to_string()))
    }
}

/// A linked account. `(public_key, provider)` is unique within a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    pub public_key: String,
    pub provider: WalletProvider,
    /// User-assigned label, e.g. "My Main Wallet".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl WalletAccount {
    pub fn new(public_key: impl Into<String>, provider: WalletProvider) -> Self {
        Self {
            public_key: public_key.into(),
            provider,
            label: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Snapshot of the wallet connection.
///
/// `Connected` implies `public_key` is set and present in `accounts`.
/// `Error` implies `error` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub provider: Option<WalletProvider>,
    pub public_key: Option<String>,
    pub network: StellarNetwork,
    pub error: Option<String>,
    pub accounts: Vec<WalletAccount>,
}

impl ConnectionState {
    pub fn new(network: StellarNetwork) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// The account currently selected, if any.
    pub fn active_account(&self) -> Option<&WalletAccount> {
        let key = self.public_key.as_deref()?;
        let provider = self.provider?;
        self.accounts
            .iter()
            .find(|a| a.public_key == key && a.provider == provider)
    }
}

/// Raw failure message reported by a provider (extension or remote bridge).
///
/// Adapters turn these into classified [`WalletError`]s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors surfaced by adapters, the registry and the connection store.
///
/// Display strings are user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// Wallet software is unavailable in this environment.
    #[error("{wallet} is not installed. Please install it from {install_url}")]
    NotInstalled { wallet: String, install_url: String },

    /// Provider refused the permission grant.
    #[error("{0}")]
    AccessDenied(String),

    /// Authorization handshake failed.
    #[error("{0}")]
    Connection(String),

    /// The user cancelled a connect or sign request.
    #[error("{0}")]
    UserRejected(String),

    #[error("{0}")]
    Signing(String),

    #[error("{0}")]
    NotConnected(String),

    #[error("Unknown wallet provider: {0}")]
    UnknownProvider(String),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}

impl WalletError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WalletError::UserRejected(_))
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
