//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use wallet_link::wallet::adapters::{BridgeFactory, ExtensionApi, PayloadEvent, RemoteBridge};
use wallet_link::wallet::storage::StorageError;
use wallet_link::wallet::{
    AdapterRegistry, KeyValueStorage, MemoryStorage, ProviderError, SessionStore, StellarNetwork,
    WalletStore,
};

/// A request as seen by a programmable backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Start a programmable mock backend on an ephemeral port and return its address.
///
/// Every request is answered by `f` with `(status, json body)` and the
/// connection is closed afterwards.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            401 => "401 Unauthorized",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some(RecordedRequest { method, path, body })
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Plain client that ignores proxy settings from the environment.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Scriptable browser-extension surface.
pub struct MockExtension {
    pub installed: bool,
    pub address: Mutex<Option<String>>,
    pub access_error: Option<String>,
    pub sign_error: Option<String>,
    pub delay: Duration,
    pub sign_calls: AtomicUsize,
}

impl MockExtension {
    pub fn with_address(address: &str) -> Self {
        Self {
            installed: true,
            address: Mutex::new(Some(address.to_string())),
            access_error: None,
            sign_error: None,
            delay: Duration::ZERO,
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn missing() -> Self {
        Self {
            installed: false,
            ..Self::with_address("")
        }
    }
}

#[async_trait]
impl ExtensionApi for MockExtension {
    async fn is_connected(&self) -> Result<bool, ProviderError> {
        Ok(self.installed)
    }

    async fn is_allowed(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }

    async fn set_allowed(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn request_access(&self) -> Result<Option<String>, ProviderError> {
        tokio::time::sleep(self.delay).await;
        if let Some(e) = &self.access_error {
            return Err(ProviderError::new(e.clone()));
        }
        Ok(self.address.lock().unwrap().clone())
    }

    async fn get_address(&self) -> Result<Option<String>, ProviderError> {
        Ok(self.address.lock().unwrap().clone())
    }

    async fn sign_transaction(&self, xdr: &str, _passphrase: &str) -> Result<String, ProviderError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        match &self.sign_error {
            Some(e) => Err(ProviderError::new(e.clone())),
            None => Ok(format!("signed:{}", xdr)),
        }
    }
}

/// Remote bridge that answers sign-in with a fixed account after `delay`
/// and replays `events` for every sign request.
pub struct MockBridge {
    pub account: Result<Option<String>, ProviderError>,
    pub events: Vec<PayloadEvent>,
    pub delay: Duration,
    pub logout_delay: Duration,
}

impl MockBridge {
    pub fn signing_in(account: &str) -> Self {
        Self {
            account: Ok(Some(account.to_string())),
            events: vec![
                PayloadEvent::Opened,
                PayloadEvent::Signed {
                    hex: Some("XUMM_SIGNED".to_string()),
                },
            ],
            delay: Duration::ZERO,
            logout_delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl RemoteBridge for MockBridge {
    async fn authorize(&self) -> Result<Option<String>, ProviderError> {
        tokio::time::sleep(self.delay).await;
        self.account.clone()
    }

    async fn logout(&self) -> Result<(), ProviderError> {
        tokio::time::sleep(self.logout_delay).await;
        Ok(())
    }

    async fn create_and_subscribe(
        &self,
        _txblob: &str,
    ) -> Result<mpsc::Receiver<PayloadEvent>, ProviderError> {
        let (tx, rx) = mpsc::channel(self.events.len().max(1));
        for event in &self.events {
            let _ = tx.send(event.clone()).await;
        }
        Ok(rx)
    }
}

pub struct MockBridgeFactory {
    pub bridge: Arc<MockBridge>,
    pub inits: AtomicUsize,
}

impl MockBridgeFactory {
    pub fn new(bridge: MockBridge) -> Self {
        Self {
            bridge: Arc::new(bridge),
            inits: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BridgeFactory for MockBridgeFactory {
    async fn init(&self) -> Result<Arc<dyn RemoteBridge>, ProviderError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(self.bridge.clone())
    }
}

/// Storage whose every operation fails, like a browser in private mode.
pub struct FailingStorage;

impl KeyValueStorage for FailingStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".into()))
    }
}

/// Store over in-memory storage, starting on testnet.
pub fn memory_store(registry: AdapterRegistry) -> (WalletStore, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let sessions = SessionStore::new(storage.clone());
    let store = WalletStore::new(Arc::new(registry), sessions, StellarNetwork::Testnet);
    (store, storage)
}
