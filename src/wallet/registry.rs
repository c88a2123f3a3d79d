//! Adapter registry.
//!
//! # Responsibilities
//! - Hold the provider seams (extension surface, remote bridge factory)
//! - Construct one adapter per provider on first use and cache it
//! - Enumerate supported and installed wallets

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::join_all;
use std::sync::Arc;

use crate::observability::metrics;
use crate::wallet::adapters::{
    BridgeFactory, ExtensionApi, FreighterAdapter, WalletAdapter, XummAdapter,
};
use crate::wallet::types::{WalletError, WalletProvider, WalletResult};

/// Provider → adapter cache.
#[derive(Default)]
pub struct AdapterRegistry {
    extension: Option<Arc<dyn ExtensionApi>>,
    bridge: Option<Arc<dyn BridgeFactory>>,
    cache: DashMap<WalletProvider, Arc<WalletAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the extension surface backing [`WalletProvider::Freighter`].
    pub fn with_extension(mut self, api: Arc<dyn ExtensionApi>) -> Self {
        self.extension = Some(api);
        self
    }

    /// Register the bridge factory backing [`WalletProvider::Xumm`].
    pub fn with_bridge(mut self, factory: Arc<dyn BridgeFactory>) -> Self {
        self.bridge = Some(factory);
        self
    }

    pub fn is_registered(&self, provider: WalletProvider) -> bool {
        match provider {
            WalletProvider::Freighter => self.extension.is_some(),
            WalletProvider::Xumm => self.bridge.is_some(),
        }
    }

    /// The cached adapter for `provider`, built on first use.
    pub fn resolve(&self, provider: WalletProvider) -> WalletResult<Arc<WalletAdapter>> {
        match self.cache.entry(provider) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let adapter = Arc::new(self.build(provider)?);
                tracing::debug!(provider = %provider, "Wallet adapter created");
                Ok(entry.insert(adapter).value().clone())
            }
        }
    }

    /// Resolve by identifier string, e.g. `"freighter"`.
    pub fn resolve_id(&self, id: &str) -> WalletResult<Arc<WalletAdapter>> {
        let provider: WalletProvider = id.parse()?;
        self.resolve(provider)
    }

    fn build(&self, provider: WalletProvider) -> WalletResult<WalletAdapter> {
        let unregistered = || WalletError::UnknownProvider(provider.to_string());
        match provider {
            WalletProvider::Freighter => {
                let api = self.extension.clone().ok_or_else(unregistered)?;
                Ok(WalletAdapter::Freighter(FreighterAdapter::new(api)))
            }
            WalletProvider::Xumm => {
                let factory = self.bridge.clone().ok_or_else(unregistered)?;
                Ok(WalletAdapter::Xumm(XummAdapter::new(factory)))
            }
        }
    }

    /// One adapter per registered provider, in declaration order.
    pub fn list_supported(&self) -> Vec<Arc<WalletAdapter>> {
        WalletProvider::ALL
            .into_iter()
            .filter(|p| self.is_registered(*p))
            .filter_map(|p| self.resolve(p).ok())
            .collect()
    }

    /// Supported adapters whose detection reports installed. Checks run
    /// concurrently; a failed check counts as not installed.
    pub async fn list_installed(&self) -> Vec<Arc<WalletAdapter>> {
        let supported = self.list_supported();
        let checks = supported.iter().map(|adapter| async move {
            let installed = adapter.is_installed().await;
            metrics::record_detection(adapter.provider(), installed);
            installed
        });
        let results = join_all(checks).await;

        supported
            .into_iter()
            .zip(results)
            .filter_map(|(adapter, installed)| installed.then_some(adapter))
            .collect()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("freighter", &self.extension.is_some())
            .field("xumm", &self.bridge.is_some())
            .field("cached", &self.cache.len())
            .finish()
    }
}
