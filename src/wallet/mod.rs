//! Wallet connection subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → store.rs (connection state machine)
//!         → registry.rs (provider → cached adapter)
//!             → adapters/ (Freighter extension, XUMM remote bridge)
//!         → session.rs → storage.rs (best-effort persistence)
//!     → transaction.rs (sign via adapter, submit to Horizon)
//!         → network.rs (passphrase + endpoints)
//! ```

pub mod adapters;
pub mod network;
pub mod registry;
pub mod session;
pub mod storage;
pub mod store;
pub mod transaction;
pub mod types;

pub use adapters::WalletAdapter;
pub use network::{config_for, NetworkConfig, NetworkTable, DEFAULT_NETWORK};
pub use registry::AdapterRegistry;
pub use session::{SessionStore, WalletSession};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{ConnectOutcome, WalletStore};
pub use transaction::{
    shorten_address, sign_and_submit, TransactionRequest, TransactionResult, TransactionStatus,
    TransactionSubmitter, TransactionTracker,
};
pub use types::{
    ConnectionState, ConnectionStatus, ProviderError, StellarNetwork, WalletAccount, WalletError,
    WalletProvider,
};
