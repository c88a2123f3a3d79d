//! XUMM wallet adapter.
//!
//! XUMM is a mobile app reached through a QR-code / deep-link flow, so
//! connection and signing are asynchronous and cross-device. The adapter
//! talks to a [`RemoteBridge`] that is created on first use by a
//! [`BridgeFactory`]; concurrent first uses share a single initialization.

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, OnceCell};

use crate::wallet::types::{ProviderError, StellarNetwork, WalletError, WalletProvider, WalletResult};

/// Status update for a sign request pushed to the user's device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadEvent {
    /// The user opened the request on their device.
    Opened,
    /// The user signed. `hex` carries the signed blob when the platform
    /// returned one.
    Signed { hex: Option<String> },
    /// The user declined or closed the request.
    Rejected,
    /// The request timed out before it was resolved.
    Expired,
}

impl PayloadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PayloadEvent::Opened)
    }
}

/// Surface of the remote signing platform.
#[async_trait]
pub trait RemoteBridge: Send + Sync {
    /// Run the sign-in flow; resolves with the account once the user
    /// approves, `None` if the platform returned no account.
    async fn authorize(&self) -> Result<Option<String>, ProviderError>;

    async fn logout(&self) -> Result<(), ProviderError>;

    /// Push `txblob` to the user and stream its status updates.
    async fn create_and_subscribe(
        &self,
        txblob: &str,
    ) -> Result<mpsc::Receiver<PayloadEvent>, ProviderError>;
}

/// Builds the bridge on first use.
#[async_trait]
pub trait BridgeFactory: Send + Sync {
    async fn init(&self) -> Result<Arc<dyn RemoteBridge>, ProviderError>;
}

/// Marker in provider messages when the user closed the sign-in request.
const CLOSED_MARKER: &str = "closed";

pub struct XummAdapter {
    factory: Arc<dyn BridgeFactory>,
    bridge: OnceCell<Arc<dyn RemoteBridge>>,
    public_key: ArcSwapOption<String>,
}

impl XummAdapter {
    pub const NAME: &'static str = "XUMM";
    pub const ICON: &'static str = "/wallets/xumm.svg";
    pub const INSTALL_URL: &'static str = "https://xumm.app/";

    pub fn new(factory: Arc<dyn BridgeFactory>) -> Self {
        Self {
            factory,
            bridge: OnceCell::new(),
            public_key: ArcSwapOption::empty(),
        }
    }

    pub fn provider(&self) -> WalletProvider {
        WalletProvider::Xumm
    }

    async fn bridge(&self) -> Result<Arc<dyn RemoteBridge>, String> {
        self.bridge
            .get_or_try_init(|| async {
                tracing::debug!("Initializing XUMM bridge");
                self.factory.init().await.map_err(|e| {
                    tracing::warn!(error = %e, "XUMM bridge initialization failed");
                    "Failed to initialize XUMM SDK".to_string()
                })
            })
            .await
            .map(Arc::clone)
    }

    /// No local binary to detect; the bridge is the integration layer.
    pub async fn is_installed(&self) -> bool {
        true
    }

    pub async fn connect(&self, _network: StellarNetwork) -> WalletResult<String> {
        let outcome: Result<String, String> = async {
            let bridge = self.bridge().await?;
            let account = bridge.authorize().await.map_err(|e| e.0)?;
            match account {
                Some(account) if !account.is_empty() => Ok(account),
                _ => Err("XUMM authorization did not return an account".to_string()),
            }
        }
        .await;

        match outcome {
            Ok(account) => {
                self.public_key.store(Some(Arc::new(account.clone())));
                Ok(account)
            }
            Err(msg) if msg.contains(CLOSED_MARKER) => Err(WalletError::UserRejected(
                "XUMM sign-in was cancelled by the user".to_string(),
            )),
            Err(msg) => Err(WalletError::Connection(format!("XUMM connection failed: {}", msg))),
        }
    }

    /// Best-effort logout; the remembered key is always cleared.
    pub async fn disconnect(&self) -> WalletResult<()> {
        if let Some(bridge) = self.bridge.get() {
            if let Err(e) = bridge.logout().await {
                tracing::debug!(error = %e, "XUMM logout failed");
            }
        }
        self.public_key.store(None);
        Ok(())
    }

    pub async fn get_public_key(&self) -> WalletResult<String> {
        self.public_key
            .load_full()
            .map(|key| key.as_ref().clone())
            .ok_or_else(|| {
                WalletError::NotConnected("XUMM is not connected. Call connect() first.".to_string())
            })
    }

    /// Push the envelope to the device and wait for a terminal event.
    pub async fn sign_transaction(&self, xdr: &str, _network: StellarNetwork) -> WalletResult<String> {
        let wrap = |msg: String| WalletError::Signing(format!("XUMM signing failed: {}", msg));

        let bridge = self.bridge().await.map_err(wrap)?;
        let mut events = bridge
            .create_and_subscribe(xdr)
            .await
            .map_err(|e| wrap(e.0))?;

        while let Some(event) = events.recv().await {
            match event {
                PayloadEvent::Opened => tracing::debug!("XUMM sign request opened on device"),
                PayloadEvent::Signed { hex: Some(hex) } if !hex.is_empty() => return Ok(hex),
                PayloadEvent::Signed { .. } => {
                    return Err(wrap("No signed transaction returned from XUMM".to_string()))
                }
                PayloadEvent::Rejected => {
                    return Err(WalletError::UserRejected(
                        "Transaction was rejected by the user".to_string(),
                    ))
                }
                PayloadEvent::Expired => return Err(wrap("sign request expired".to_string())),
            }
        }

        Err(wrap("subscription closed before the request was resolved".to_string()))
    }
}

impl std::fmt::Debug for XummAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XummAdapter")
            .field("initialized", &self.bridge.initialized())
            .finish()
    }
}
