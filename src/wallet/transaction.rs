//! Transaction signing, submission and progress tracking.
//!
//! # Responsibilities
//! - Have the adapter sign an XDR envelope for the target network
//! - Submit the signed envelope to Horizon (`POST /transactions`)
//! - Turn every failure into a [`TransactionResult`], never an error
//! - Publish lifecycle progress for callers that display it

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::SubmissionConfig;
use crate::observability::metrics;
use crate::wallet::adapters::WalletAdapter;
use crate::wallet::network::NetworkTable;
use crate::wallet::types::StellarNetwork;

const SUBMISSION_FAILED: &str = "Transaction submission failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Idle,
    Building,
    AwaitingSignature,
    Submitting,
    Success,
    Error,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Success | TransactionStatus::Error)
    }
}

/// Outcome of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Ledger the transaction was included in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionResult {
    pub fn success(hash: impl Into<String>, ledger: Option<u64>) -> Self {
        Self {
            status: TransactionStatus::Success,
            hash: Some(hash.into()),
            ledger,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: TransactionStatus::Error,
            hash: None,
            ledger: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Success
    }
}

/// A transaction awaiting the user's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Shown to the user while confirming.
    pub description: String,
    /// XDR-encoded transaction envelope.
    pub xdr: String,
    pub network: StellarNetwork,
}

/// Publishes lifecycle progress to any number of watchers.
#[derive(Debug)]
pub struct TransactionTracker {
    tx: watch::Sender<TransactionStatus>,
}

impl TransactionTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(TransactionStatus::Idle);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<TransactionStatus> {
        self.tx.subscribe()
    }

    pub fn status(&self) -> TransactionStatus {
        *self.tx.borrow()
    }

    /// Back to idle, e.g. when a confirmation dialog is dismissed.
    pub fn reset(&self) {
        self.set(TransactionStatus::Idle);
    }

    fn set(&self, status: TransactionStatus) {
        self.tx.send_replace(status);
    }
}

impl Default for TransactionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
enum SubmitError {
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed Horizon response: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
    #[serde(default)]
    ledger: Option<u64>,
}

/// Signs through an adapter and submits to Horizon.
#[derive(Debug, Clone)]
pub struct TransactionSubmitter {
    client: reqwest::Client,
    networks: NetworkTable,
}

impl TransactionSubmitter {
    pub fn new(networks: NetworkTable, config: &SubmissionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self::with_client(client, networks)
    }

    pub fn with_client(client: reqwest::Client, networks: NetworkTable) -> Self {
        Self { client, networks }
    }

    /// Sign `xdr` with `adapter` and submit it to `network`.
    pub async fn sign_and_submit(
        &self,
        adapter: &WalletAdapter,
        xdr: &str,
        network: StellarNetwork,
    ) -> TransactionResult {
        self.run(adapter, xdr, network, None).await
    }

    /// Like [`sign_and_submit`](Self::sign_and_submit), publishing each
    /// lifecycle step on `tracker`.
    pub async fn sign_and_submit_tracked(
        &self,
        adapter: &WalletAdapter,
        request: &TransactionRequest,
        tracker: &TransactionTracker,
    ) -> TransactionResult {
        tracing::info!(description = %request.description, "Transaction requested");
        self.run(adapter, &request.xdr, request.network, Some(tracker)).await
    }

    async fn run(
        &self,
        adapter: &WalletAdapter,
        xdr: &str,
        network: StellarNetwork,
        tracker: Option<&TransactionTracker>,
    ) -> TransactionResult {
        let step = |status| {
            if let Some(t) = tracker {
                t.set(status);
            }
        };
        let attempt = Uuid::new_v4();

        step(TransactionStatus::Building);
        let config = self.networks.resolve(network);

        step(TransactionStatus::AwaitingSignature);
        let result = match adapter.sign_transaction(xdr, network).await {
            Err(e) => {
                tracing::info!(
                    %attempt,
                    provider = %adapter.provider(),
                    rejected = e.is_user_rejection(),
                    error = %e,
                    "Signing failed"
                );
                TransactionResult::failure(e.to_string())
            }
            Ok(signed) => {
                step(TransactionStatus::Submitting);
                match self.submit(&config.horizon_url, &signed).await {
                    Ok(response) => {
                        tracing::info!(
                            %attempt,
                            hash = %response.hash,
                            ledger = ?response.ledger,
                            network = %network,
                            "Transaction submitted"
                        );
                        TransactionResult::success(response.hash, response.ledger)
                    }
                    Err(e) => {
                        tracing::warn!(%attempt, network = %network, error = %e, "Submission failed");
                        TransactionResult::failure(e.to_string())
                    }
                }
            }
        };

        step(result.status);
        metrics::record_transaction(
            network,
            if result.is_success() { "success" } else { "error" },
        );
        result
    }

    async fn submit(&self, horizon_url: &str, signed: &str) -> Result<SubmitResponse, SubmitError> {
        let response = self
            .client
            .post(format!("{}/transactions", horizon_url))
            .form(&[("tx", signed)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| error_detail(&v))
                .unwrap_or_else(|| SUBMISSION_FAILED.to_string());
            return Err(SubmitError::Rejected(detail));
        }

        serde_json::from_str(&body).map_err(|e| SubmitError::Malformed(e.to_string()))
    }
}

/// Most specific error in a Horizon problem document: the transaction result
/// code, then `detail`.
fn error_detail(body: &Value) -> Option<String> {
    let candidates = [
        body.pointer("/extras/result_codes/transaction"),
        body.get("detail"),
    ];
    candidates.into_iter().flatten().find_map(|v| match v {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    })
}

/// Sign and submit using the built-in network table and default settings.
pub async fn sign_and_submit(
    adapter: &WalletAdapter,
    xdr: &str,
    network: StellarNetwork,
) -> TransactionResult {
    static DEFAULT: OnceLock<TransactionSubmitter> = OnceLock::new();
    DEFAULT
        .get_or_init(|| TransactionSubmitter::new(NetworkTable::default(), &SubmissionConfig::default()))
        .sign_and_submit(adapter, xdr, network)
        .await
}

/// Display form `head...tail` of an address.
///
/// Returns the input unchanged when it is shorter than `2 * chars + 3`.
pub fn shorten_address(address: &str, chars: usize) -> String {
    let len = address.chars().count();
    if len < chars * 2 + 3 {
        return address.to_string();
    }
    let head: String = address.chars().take(chars).collect();
    let tail: String = address.chars().skip(len - chars).collect();
    format!("{}...{}", head, tail)
}
