//! Metrics collection.
//!
//! # Metrics
//! - `wallet_connect_attempts_total` (counter): connect calls by provider
//! - `wallet_connect_results_total` (counter): outcomes by provider, outcome
//! - `wallet_transactions_total` (counter): submissions by network, status
//! - `wallet_session_failures_total` (counter): swallowed storage failures by operation
//! - `wallet_detection_total` (counter): install checks by provider, installed

use crate::wallet::types::{StellarNetwork, WalletProvider};

pub fn record_connect_attempt(provider: WalletProvider) {
    ::metrics::counter!("wallet_connect_attempts_total", "provider" => provider.as_str()).increment(1);
}

/// `outcome` is one of `connected`, `failed`, `superseded`.
pub fn record_connect_result(provider: WalletProvider, outcome: &'static str) {
    ::metrics::counter!(
        "wallet_connect_results_total",
        "provider" => provider.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_transaction(network: StellarNetwork, status: &'static str) {
    ::metrics::counter!(
        "wallet_transactions_total",
        "network" => network.as_str(),
        "status" => status
    )
    .increment(1);
}

pub fn record_session_failure(operation: &'static str) {
    ::metrics::counter!("wallet_session_failures_total", "operation" => operation).increment(1);
}

pub fn record_detection(provider: WalletProvider, installed: bool) {
    ::metrics::counter!(
        "wallet_detection_total",
        "provider" => provider.as_str(),
        "installed" => if installed { "true" } else { "false" }
    )
    .increment(1);
}
