//! Connection state machine.
//!
//! # Data Flow
//! ```text
//! caller action (connect / disconnect / switch / restore)
//!     → registry.rs resolves the adapter
//!     → adapter performs the provider flow
//!     → state updated via read-copy-update on an ArcSwap
//!     → session.rs persists or clears the record
//! ```
//!
//! # Ordering
//! Each connect and disconnect takes a new generation number. A connect only
//! applies its result while its generation is still the newest, so the last
//! action invoked wins regardless of completion order.

use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;
use crate::wallet::registry::AdapterRegistry;
use crate::wallet::session::SessionStore;
use crate::wallet::transaction::shorten_address;
use crate::wallet::types::{
    ConnectionState, ConnectionStatus, StellarNetwork, WalletAccount, WalletError, WalletProvider,
};

const CONNECT_FALLBACK_ERROR: &str = "Failed to connect wallet";

/// What happened to a connect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(String),
    Failed(String),
    /// A newer connect or disconnect started before this one finished.
    Superseded,
}

/// Owns the connection state for one client.
pub struct WalletStore {
    state: ArcSwap<ConnectionState>,
    registry: Arc<AdapterRegistry>,
    sessions: SessionStore,
    generation: AtomicU64,
}

impl WalletStore {
    pub fn new(registry: Arc<AdapterRegistry>, sessions: SessionStore, network: StellarNetwork) -> Self {
        Self {
            state: ArcSwap::from_pointee(ConnectionState::new(network)),
            registry,
            sessions,
            generation: AtomicU64::new(0),
        }
    }

    /// Read-only view of the current state.
    pub fn snapshot(&self) -> Arc<ConnectionState> {
        self.state.load_full()
    }

    pub fn registry(&self) -> &Arc<AdapterRegistry> {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn update(&self, mut f: impl FnMut(&mut ConnectionState)) {
        self.state.rcu(|current| {
            let mut next = ConnectionState::clone(current);
            f(&mut next);
            next
        });
    }

    /// Apply `f` only if `token` is still the newest generation.
    fn update_if_current(&self, token: u64, mut f: impl FnMut(&mut ConnectionState)) -> bool {
        let mut applied = false;
        self.state.rcu(|current| {
            let mut next = ConnectionState::clone(current);
            applied = self.generation.load(Ordering::SeqCst) == token;
            if applied {
                f(&mut next);
            }
            next
        });
        applied
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Connect through `provider`. Failures are recorded in the state,
    /// never returned.
    pub async fn connect(&self, provider: WalletProvider) -> ConnectOutcome {
        let token = self.next_generation();
        metrics::record_connect_attempt(provider);

        self.update(|s| {
            s.status = ConnectionStatus::Connecting;
            s.error = None;
            s.provider = Some(provider);
            s.public_key = None;
        });

        let outcome = match self.authorize(provider).await {
            Ok(public_key) => self.finish_connect(token, provider, public_key),
            Err(e) => self.fail_connect(token, provider, e),
        };

        metrics::record_connect_result(
            provider,
            match outcome {
                ConnectOutcome::Connected(_) => "connected",
                ConnectOutcome::Failed(_) => "failed",
                ConnectOutcome::Superseded => "superseded",
            },
        );
        outcome
    }

    async fn authorize(&self, provider: WalletProvider) -> Result<String, WalletError> {
        let adapter = self.registry.resolve(provider)?;

        if !adapter.is_installed().await {
            return Err(WalletError::NotInstalled {
                wallet: adapter.name().to_string(),
                install_url: adapter.install_url().to_string(),
            });
        }

        let network = self.snapshot().network;
        adapter.connect(network).await
    }

    fn finish_connect(&self, token: u64, provider: WalletProvider, public_key: String) -> ConnectOutcome {
        let mut network = StellarNetwork::default();
        let applied = self.update_if_current(token, |s| {
            let exists = s
                .accounts
                .iter()
                .any(|a| a.public_key == public_key && a.provider == provider);
            if !exists {
                s.accounts.push(WalletAccount::new(public_key.clone(), provider));
            }
            s.status = ConnectionStatus::Connected;
            s.provider = Some(provider);
            s.public_key = Some(public_key.clone());
            s.error = None;
            network = s.network;
        });

        if !applied {
            tracing::debug!(provider = %provider, "Discarding superseded connect result");
            return ConnectOutcome::Superseded;
        }

        self.sessions.save(provider, &public_key, network);
        tracing::info!(
            provider = %provider,
            public_key = %shorten_address(&public_key, 4),
            network = %network,
            "Wallet connected"
        );
        ConnectOutcome::Connected(public_key)
    }

    fn fail_connect(&self, token: u64, provider: WalletProvider, err: WalletError) -> ConnectOutcome {
        let mut message = err.to_string();
        if message.trim().is_empty() {
            message = CONNECT_FALLBACK_ERROR.to_string();
        }

        let applied = self.update_if_current(token, |s| {
            s.status = ConnectionStatus::Error;
            s.error = Some(message.clone());
        });

        if !applied {
            return ConnectOutcome::Superseded;
        }

        tracing::warn!(provider = %provider, error = %message, "Wallet connection failed");
        ConnectOutcome::Failed(message)
    }

    /// Drop the active connection. The accounts list is kept.
    ///
    /// A connect invoked while the adapter is still disconnecting takes
    /// precedence; its state and session are left in place.
    pub async fn disconnect(&self) {
        let token = self.next_generation();
        let provider = self.snapshot().provider;

        if let Some(provider) = provider {
            match self.registry.resolve(provider) {
                Ok(adapter) => {
                    if let Err(e) = adapter.disconnect().await {
                        tracing::debug!(provider = %provider, error = %e, "Adapter disconnect failed");
                    }
                }
                Err(e) => tracing::debug!(error = %e, "No adapter to disconnect"),
            }
        }

        let applied = self.update_if_current(token, |s| {
            s.status = ConnectionStatus::Disconnected;
            s.provider = None;
            s.public_key = None;
            s.error = None;
        });

        if !applied {
            tracing::debug!("Discarding superseded disconnect");
            return;
        }

        self.sessions.clear();
        tracing::info!("Wallet disconnected");
    }

    /// Make a previously connected account active. Unknown keys are ignored.
    /// The account is assumed to still be authorized; the adapter is not
    /// consulted.
    pub fn switch_account(&self, public_key: &str) {
        let Some(account) = self
            .snapshot()
            .accounts
            .iter()
            .find(|a| a.public_key == public_key)
            .cloned()
        else {
            tracing::debug!("Ignoring switch to unknown account");
            return;
        };

        let mut network = StellarNetwork::default();
        self.update(|s| {
            s.public_key = Some(account.public_key.clone());
            s.provider = Some(account.provider);
            s.status = ConnectionStatus::Connected;
            s.error = None;
            network = s.network;
        });

        self.sessions.save(account.provider, &account.public_key, network);
        tracing::info!(
            provider = %account.provider,
            public_key = %shorten_address(&account.public_key, 4),
            "Switched account"
        );
    }

    /// Change the active network. A live connection is re-persisted under
    /// the new network without being re-validated.
    pub fn switch_network(&self, network: StellarNetwork) {
        let mut active = None;
        self.update(|s| {
            s.network = network;
            active = match (s.status, s.provider, s.public_key.clone()) {
                (ConnectionStatus::Connected, Some(provider), Some(key)) => Some((provider, key)),
                _ => None,
            };
        });

        if let Some((provider, key)) = active {
            self.sessions.save(provider, &key, network);
        }
        tracing::info!(network = %network, "Switched network");
    }

    /// Reconnect from the persisted session, if any. Call once at startup.
    ///
    /// The session's network is adopted before the attempt. A failed attempt
    /// clears the session and leaves the store disconnected without an error.
    /// Returns `None` when nothing was persisted.
    pub async fn restore_session(&self) -> Option<ConnectOutcome> {
        let session = self.sessions.load()?;

        tracing::info!(
            provider = %session.provider,
            network = %session.network,
            connected_at = %session.connected_at,
            "Restoring wallet session"
        );
        self.update(|s| s.network = session.network);

        let outcome = self.connect(session.provider).await;
        if let ConnectOutcome::Failed(reason) = &outcome {
            tracing::info!(reason = %reason, "Session restore failed, clearing session");
            self.sessions.clear();
            self.update(|s| {
                if s.status == ConnectionStatus::Error {
                    s.status = ConnectionStatus::Disconnected;
                    s.provider = None;
                    s.error = None;
                }
            });
        }
        Some(outcome)
    }

    /// Force the error state with `message`.
    pub fn set_error(&self, message: impl Into<String>) {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = CONNECT_FALLBACK_ERROR.to_string();
        }
        self.update(|s| {
            s.status = ConnectionStatus::Error;
            s.error = Some(message.clone());
        });
    }

    /// Clear the error, revealing whatever connection actually exists.
    pub fn clear_error(&self) {
        self.update(|s| {
            s.error = None;
            s.status = if s.public_key.is_some() {
                ConnectionStatus::Connected
            } else {
                ConnectionStatus::Disconnected
            };
        });
    }
}

impl std::fmt::Debug for WalletStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletStore")
            .field("state", &self.snapshot())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}
