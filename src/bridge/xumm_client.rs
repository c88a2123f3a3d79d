//! XUMM platform REST client.
//!
//! # Responsibilities
//! - Create sign requests (`POST /payload`) and surface their deep link
//! - Poll request status (`GET /payload/{uuid}`) until it resolves
//! - Enforce the payload timeout and back off on failed polls

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

use crate::config::XummConfig;
use crate::resilience::retry_delay;
use crate::wallet::adapters::{BridgeFactory, PayloadEvent, RemoteBridge};
use crate::wallet::types::ProviderError;

#[derive(Debug, Clone, Deserialize)]
struct CreatedPayload {
    uuid: String,
    #[serde(default)]
    next: Option<PayloadNext>,
    #[serde(default)]
    refs: Option<PayloadRefs>,
}

#[derive(Debug, Clone, Deserialize)]
struct PayloadNext {
    always: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PayloadRefs {
    #[serde(default)]
    qr_png: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PayloadMeta {
    opened: bool,
    resolved: bool,
    signed: bool,
    cancelled: bool,
    expired: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PayloadResponse {
    hex: Option<String>,
    account: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PayloadDetails {
    #[serde(default)]
    meta: PayloadMeta,
    #[serde(default)]
    response: PayloadResponse,
}

/// Terminal state of a polled payload.
#[derive(Debug)]
enum Resolution {
    Signed(PayloadResponse),
    Rejected,
    Expired,
    /// The event receiver was dropped before the payload resolved.
    Abandoned,
}

/// Handle on the XUMM platform API.
#[derive(Clone)]
pub struct XummClient {
    http: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    payload_timeout: Duration,
    max_poll_failures: u32,
}

impl XummClient {
    /// Build a client with credentials from `config`.
    pub fn new(config: &XummConfig) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&config.api_key)
                .map_err(|e| ProviderError::new(format!("invalid API key: {}", e)))?,
        );
        let mut secret = HeaderValue::from_str(&config.api_secret)
            .map_err(|e| ProviderError::new(format!("invalid API secret: {}", e)))?;
        secret.set_sensitive(true);
        headers.insert("x-api-secret", secret);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::new(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self::with_http_client(http, config))
    }

    /// Use a preconfigured HTTP client (headers are the caller's concern).
    pub fn with_http_client(http: reqwest::Client, config: &XummConfig) -> Self {
        Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            payload_timeout: Duration::from_secs(config.payload_timeout_secs),
            max_poll_failures: config.max_poll_failures,
        }
    }

    async fn create_payload(&self, body: serde_json::Value) -> Result<CreatedPayload, ProviderError> {
        let response = self
            .http
            .post(format!("{}/payload", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("payload request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::new(format!(
                "platform returned status {}: {}",
                status, text
            )));
        }

        let created: CreatedPayload = response
            .json()
            .await
            .map_err(|e| ProviderError::new(format!("malformed payload response: {}", e)))?;

        tracing::info!(
            uuid = %created.uuid,
            link = created.next.as_ref().map(|n| n.always.as_str()).unwrap_or(""),
            qr = created.refs.as_ref().and_then(|r| r.qr_png.as_deref()).unwrap_or(""),
            "XUMM request created, open the link or scan the QR code to continue"
        );
        Ok(created)
    }

    async fn fetch_payload(&self, uuid: &str) -> Result<PayloadDetails, ProviderError> {
        let response = self
            .http
            .get(format!("{}/payload/{}", self.base_url, uuid))
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("status request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::new(format!("platform returned status {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::new(format!("malformed status response: {}", e)))
    }

    /// Poll `uuid` until it resolves, forwarding non-terminal updates to `events`.
    async fn poll_until_resolved(
        &self,
        uuid: &str,
        events: Option<&mpsc::Sender<PayloadEvent>>,
    ) -> Result<Resolution, ProviderError> {
        let deadline = Instant::now() + self.payload_timeout;
        let mut failures = 0u32;
        let mut opened = false;

        loop {
            if events.is_some_and(|tx| tx.is_closed()) {
                tracing::debug!(uuid = %uuid, "XUMM request no longer awaited, stopping poll");
                return Ok(Resolution::Abandoned);
            }
            if Instant::now() >= deadline {
                tracing::debug!(uuid = %uuid, "XUMM request timed out");
                return Ok(Resolution::Expired);
            }

            match self.fetch_payload(uuid).await {
                Ok(details) => {
                    failures = 0;
                    let meta = &details.meta;

                    if meta.opened && !opened {
                        opened = true;
                        if let Some(tx) = events {
                            let _ = tx.send(PayloadEvent::Opened).await;
                        }
                    }

                    if meta.signed {
                        return Ok(Resolution::Signed(details.response));
                    }
                    if meta.expired {
                        return Ok(Resolution::Expired);
                    }
                    if meta.resolved || meta.cancelled {
                        return Ok(Resolution::Rejected);
                    }

                    sleep(self.poll_interval).await;
                }
                Err(e) => {
                    failures += 1;
                    if failures >= self.max_poll_failures {
                        return Err(e);
                    }
                    let delay = retry_delay(failures, self.poll_interval, self.poll_interval * 8);
                    tracing::warn!(uuid = %uuid, error = %e, failures, "XUMM status poll failed, backing off");
                    sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl RemoteBridge for XummClient {
    async fn authorize(&self) -> Result<Option<String>, ProviderError> {
        let created = self
            .create_payload(json!({ "txjson": { "TransactionType": "SignIn" } }))
            .await?;

        match self.poll_until_resolved(&created.uuid, None).await? {
            Resolution::Signed(response) => Ok(response.account.filter(|a| !a.is_empty())),
            Resolution::Rejected => Err(ProviderError::new("sign-in request closed by the user")),
            Resolution::Expired => Err(ProviderError::new("sign-in request expired")),
            Resolution::Abandoned => Err(ProviderError::new("sign-in request abandoned")),
        }
    }

    /// No server-side session exists for platform payloads.
    async fn logout(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn create_and_subscribe(
        &self,
        txblob: &str,
    ) -> Result<mpsc::Receiver<PayloadEvent>, ProviderError> {
        let created = self.create_payload(json!({ "txblob": txblob })).await?;
        let (tx, rx) = mpsc::channel(4);
        let client = self.clone();

        tokio::spawn(async move {
            let terminal = match client.poll_until_resolved(&created.uuid, Some(&tx)).await {
                Ok(Resolution::Signed(response)) => PayloadEvent::Signed { hex: response.hex },
                Ok(Resolution::Rejected) => PayloadEvent::Rejected,
                Ok(Resolution::Expired) => PayloadEvent::Expired,
                Ok(Resolution::Abandoned) => return,
                Err(e) => {
                    // Dropping the sender closes the subscription.
                    tracing::warn!(uuid = %created.uuid, error = %e, "Giving up on XUMM request");
                    return;
                }
            };
            let _ = tx.send(terminal).await;
        });

        Ok(rx)
    }
}

impl std::fmt::Debug for XummClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XummClient")
            .field("base_url", &self.base_url)
            .field("poll_interval", &self.poll_interval)
            .field("payload_timeout", &self.payload_timeout)
            .finish()
    }
}

/// Creates the [`XummClient`] on first use of the XUMM adapter.
#[derive(Debug, Clone)]
pub struct XummBridgeFactory {
    config: XummConfig,
}

impl XummBridgeFactory {
    pub fn new(config: XummConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BridgeFactory for XummBridgeFactory {
    async fn init(&self) -> Result<Arc<dyn RemoteBridge>, ProviderError> {
        if self.config.api_key.is_empty() {
            tracing::warn!(
                "XUMM API key not configured. Set {} in your environment.",
                crate::config::loader::XUMM_API_KEY_ENV_VAR
            );
        }
        let client = XummClient::new(&self.config)?;
        tracing::info!(api_url = %self.config.api_url, "XUMM bridge ready");
        Ok(Arc::new(client))
    }
}
