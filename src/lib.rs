//! Stellar wallet connection layer.
//!
//! Links external signing wallets (Freighter extension, XUMM mobile), keeps
//! connection state and a persisted session, and drives transactions through
//! sign → submit → confirm.

pub mod bridge;
pub mod config;
pub mod observability;
pub mod resilience;
pub mod wallet;

pub use config::schema::WalletConfig;
pub use wallet::{AdapterRegistry, TransactionSubmitter, WalletStore};
