//! Wallet adapters.
//!
//! One variant per [`WalletProvider`]. Callers hold a [`WalletAdapter`] and
//! never see provider-specific connect/sign/detect mechanics.

pub mod freighter;
pub mod xumm;

pub use freighter::{DetachedExtension, ExtensionApi, FreighterAdapter};
pub use xumm::{BridgeFactory, PayloadEvent, RemoteBridge, XummAdapter};

use crate::wallet::types::{StellarNetwork, WalletProvider, WalletResult};

/// Uniform capability surface over every supported wallet.
#[derive(Debug)]
pub enum WalletAdapter {
    Freighter(FreighterAdapter),
    Xumm(XummAdapter),
}

impl WalletAdapter {
    /// Human-readable name for display.
    pub fn name(&self) -> &'static str {
        match self {
            WalletAdapter::Freighter(_) => FreighterAdapter::NAME,
            WalletAdapter::Xumm(_) => XummAdapter::NAME,
        }
    }

    pub fn provider(&self) -> WalletProvider {
        match self {
            WalletAdapter::Freighter(a) => a.provider(),
            WalletAdapter::Xumm(a) => a.provider(),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WalletAdapter::Freighter(_) => FreighterAdapter::ICON,
            WalletAdapter::Xumm(_) => XummAdapter::ICON,
        }
    }

    /// Where the user can get the wallet.
    pub fn install_url(&self) -> &'static str {
        match self {
            WalletAdapter::Freighter(_) => FreighterAdapter::INSTALL_URL,
            WalletAdapter::Xumm(_) => XummAdapter::INSTALL_URL,
        }
    }

    /// Whether the wallet is usable here. Never errors; a failed check is `false`.
    pub async fn is_installed(&self) -> bool {
        match self {
            WalletAdapter::Freighter(a) => a.is_installed().await,
            WalletAdapter::Xumm(a) => a.is_installed().await,
        }
    }

    /// Run the provider's authorization flow and return the account key.
    pub async fn connect(&self, network: StellarNetwork) -> WalletResult<String> {
        match self {
            WalletAdapter::Freighter(a) => a.connect(network).await,
            WalletAdapter::Xumm(a) => a.connect(network).await,
        }
    }

    pub async fn disconnect(&self) -> WalletResult<()> {
        match self {
            WalletAdapter::Freighter(a) => a.disconnect().await,
            WalletAdapter::Xumm(a) => a.disconnect().await,
        }
    }

    pub async fn get_public_key(&self) -> WalletResult<String> {
        match self {
            WalletAdapter::Freighter(a) => a.get_public_key().await,
            WalletAdapter::Xumm(a) => a.get_public_key().await,
        }
    }

    /// Sign an XDR envelope for `network`. Failures are always classified;
    /// user cancellation surfaces as `WalletError::UserRejected`.
    pub async fn sign_transaction(&self, xdr: &str, network: StellarNetwork) -> WalletResult<String> {
        match self {
            WalletAdapter::Freighter(a) => a.sign_transaction(xdr, network).await,
            WalletAdapter::Xumm(a) => a.sign_transaction(xdr, network).await,
        }
    }
}
