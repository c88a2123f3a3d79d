//! Freighter browser-extension adapter.
//!
//! The extension is reached through [`ExtensionApi`], which mirrors the
//! injected freighter API (`isConnected`, `isAllowed`, `setAllowed`,
//! `requestAccess`, `getAddress`, `signTransaction`). Hosts without an
//! injected extension use [`DetachedExtension`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::wallet::network::passphrase;
use crate::wallet::types::{ProviderError, StellarNetwork, WalletError, WalletProvider, WalletResult};

/// Marker the extension puts in its error when the user dismisses a prompt.
const USER_DECLINED_MARKER: &str = "User declined";

/// Surface of the injected Freighter extension.
#[async_trait]
pub trait ExtensionApi: Send + Sync {
    /// Whether the extension is present and responsive.
    async fn is_connected(&self) -> Result<bool, ProviderError>;

    /// Whether this application was already granted access.
    async fn is_allowed(&self) -> Result<bool, ProviderError>;

    /// Prompt the user to grant access.
    async fn set_allowed(&self) -> Result<(), ProviderError>;

    /// Request the active account's address. `None` when the extension
    /// answered without one.
    async fn request_access(&self) -> Result<Option<String>, ProviderError>;

    async fn get_address(&self) -> Result<Option<String>, ProviderError>;

    /// Sign an XDR envelope for the network identified by `network_passphrase`.
    async fn sign_transaction(
        &self,
        xdr: &str,
        network_passphrase: &str,
    ) -> Result<String, ProviderError>;
}

/// Extension surface for hosts with no injected extension. Detection fails,
/// so the adapter reports itself as not installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedExtension;

impl DetachedExtension {
    fn unavailable() -> ProviderError {
        ProviderError::new("no browser extension host attached")
    }
}

#[async_trait]
impl ExtensionApi for DetachedExtension {
    async fn is_connected(&self) -> Result<bool, ProviderError> {
        Err(Self::unavailable())
    }

    async fn is_allowed(&self) -> Result<bool, ProviderError> {
        Err(Self::unavailable())
    }

    async fn set_allowed(&self) -> Result<(), ProviderError> {
        Err(Self::unavailable())
    }

    async fn request_access(&self) -> Result<Option<String>, ProviderError> {
        Err(Self::unavailable())
    }

    async fn get_address(&self) -> Result<Option<String>, ProviderError> {
        Err(Self::unavailable())
    }

    async fn sign_transaction(&self, _xdr: &str, _passphrase: &str) -> Result<String, ProviderError> {
        Err(Self::unavailable())
    }
}

pub struct FreighterAdapter {
    api: Arc<dyn ExtensionApi>,
}

impl FreighterAdapter {
    pub const NAME: &'static str = "Freighter";
    pub const ICON: &'static str = "/wallets/freighter.svg";
    pub const INSTALL_URL: &'static str = "https://www.freighter.app/";

    pub fn new(api: Arc<dyn ExtensionApi>) -> Self {
        Self { api }
    }

    pub fn provider(&self) -> WalletProvider {
        WalletProvider::Freighter
    }

    pub async fn is_installed(&self) -> bool {
        match self.api.is_connected().await {
            Ok(connected) => connected,
            Err(e) => {
                tracing::debug!(error = %e, "Freighter detection failed");
                false
            }
        }
    }

    /// Request permission if needed, then the active address.
    pub async fn connect(&self, _network: StellarNetwork) -> WalletResult<String> {
        if !self.is_installed().await {
            return Err(WalletError::NotInstalled {
                wallet: "Freighter extension".to_string(),
                install_url: Self::INSTALL_URL.to_string(),
            });
        }

        let allowed = self
            .api
            .is_allowed()
            .await
            .map_err(|e| WalletError::AccessDenied(format!("Freighter access denied: {}", e)))?;

        if !allowed {
            self.api
                .set_allowed()
                .await
                .map_err(|e| WalletError::AccessDenied(format!("Freighter access denied: {}", e)))?;
        }

        let address = self
            .api
            .request_access()
            .await
            .map_err(|e| WalletError::Connection(format!("Freighter access failed: {}", e)))?;

        match address {
            Some(address) if !address.is_empty() => Ok(address),
            _ => Err(WalletError::Connection(
                "Failed to retrieve address from Freighter".to_string(),
            )),
        }
    }

    /// Nothing to do locally; access is revoked from the extension itself.
    pub async fn disconnect(&self) -> WalletResult<()> {
        Ok(())
    }

    pub async fn get_public_key(&self) -> WalletResult<String> {
        match self.api.get_address().await {
            Ok(Some(address)) if !address.is_empty() => Ok(address),
            _ => Err(WalletError::NotConnected(
                "Unable to get public key. Is Freighter connected?".to_string(),
            )),
        }
    }

    pub async fn sign_transaction(&self, xdr: &str, network: StellarNetwork) -> WalletResult<String> {
        if !self.is_installed().await {
            return Err(WalletError::Signing("Freighter extension is not available".to_string()));
        }

        match self.api.sign_transaction(xdr, passphrase(network)).await {
            Ok(signed) if !signed.is_empty() => Ok(signed),
            Ok(_) => Err(WalletError::Signing(
                "Failed to sign transaction: extension returned an empty envelope".to_string(),
            )),
            Err(e) if e.message().contains(USER_DECLINED_MARKER) => Err(WalletError::UserRejected(
                "Transaction was rejected by the user".to_string(),
            )),
            Err(e) => Err(WalletError::Signing(format!("Failed to sign transaction: {}", e))),
        }
    }
}

impl std::fmt::Debug for FreighterAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreighterAdapter").finish_non_exhaustive()
    }
}
