//! Connection state machine tests against scripted wallets.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use wallet_link::wallet::{
    AdapterRegistry, ConnectOutcome, ConnectionStatus, KeyValueStorage, ProviderError,
    SessionStore, StellarNetwork, WalletProvider, WalletStore,
};

mod common;
use common::{memory_store, FailingStorage, MockBridge, MockBridgeFactory, MockExtension};

const FREIGHTER_KEY: &str = "GBFREIGHTERACCOUNTAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
const XUMM_KEY: &str = "rXUMMACCOUNT111111111111111111";

fn registry(extension: MockExtension, bridge: MockBridge) -> AdapterRegistry {
    AdapterRegistry::new()
        .with_extension(Arc::new(extension))
        .with_bridge(Arc::new(MockBridgeFactory::new(bridge)))
}

#[tokio::test]
async fn test_connect_then_disconnect() {
    let (store, storage) = memory_store(registry(
        MockExtension::with_address(FREIGHTER_KEY),
        MockBridge::signing_in(XUMM_KEY),
    ));

    let outcome = store.connect(WalletProvider::Freighter).await;
    assert_eq!(outcome, ConnectOutcome::Connected(FREIGHTER_KEY.to_string()));

    let state = store.snapshot();
    assert_eq!(state.status, ConnectionStatus::Connected);
    assert_eq!(state.provider, Some(WalletProvider::Freighter));
    assert_eq!(state.public_key.as_deref(), Some(FREIGHTER_KEY));
    assert_eq!(state.accounts.len(), 1);
    assert!(state.active_account().is_some());

    let session = store.sessions().load().expect("session persisted");
    assert_eq!(session.provider, WalletProvider::Freighter);
    assert_eq!(session.public_key, FREIGHTER_KEY);
    assert_eq!(session.network, StellarNetwork::Testnet);

    store.disconnect().await;
    let state = store.snapshot();
    assert_eq!(state.status, ConnectionStatus::Disconnected);
    assert_eq!(state.provider, None);
    assert_eq!(state.public_key, None);
    assert_eq!(state.error, None);
    // Account history survives a disconnect.
    assert_eq!(state.accounts.len(), 1);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_reconnect_does_not_duplicate_accounts() {
    let (store, _) = memory_store(registry(
        MockExtension::with_address(FREIGHTER_KEY),
        MockBridge::signing_in(XUMM_KEY),
    ));

    store.connect(WalletProvider::Freighter).await;
    store.connect(WalletProvider::Freighter).await;
    store.connect(WalletProvider::Xumm).await;
    store.connect(WalletProvider::Freighter).await;

    let state = store.snapshot();
    assert_eq!(state.accounts.len(), 2);
    assert_eq!(state.provider, Some(WalletProvider::Freighter));
}

#[tokio::test]
async fn test_not_installed_error() {
    let (store, storage) = memory_store(registry(
        MockExtension::missing(),
        MockBridge::signing_in(XUMM_KEY),
    ));

    let outcome = store.connect(WalletProvider::Freighter).await;
    let expected = "Freighter is not installed. Please install it from https://www.freighter.app/";
    assert_eq!(outcome, ConnectOutcome::Failed(expected.to_string()));

    let state = store.snapshot();
    assert_eq!(state.status, ConnectionStatus::Error);
    assert_eq!(state.error.as_deref(), Some(expected));
    assert_eq!(state.public_key, None);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_unregistered_provider_fails_connect() {
    let freighter_only =
        AdapterRegistry::new().with_extension(Arc::new(MockExtension::with_address(FREIGHTER_KEY)));
    let (store, _) = memory_store(freighter_only);

    let outcome = store.connect(WalletProvider::Xumm).await;
    assert_eq!(
        outcome,
        ConnectOutcome::Failed("Unknown wallet provider: xumm".to_string())
    );
}

#[tokio::test]
async fn test_cancelled_sign_in_is_user_rejection() {
    let bridge = MockBridge {
        account: Err(ProviderError::new("sign-in request closed by the user")),
        ..MockBridge::signing_in(XUMM_KEY)
    };
    let (store, _) = memory_store(registry(MockExtension::missing(), bridge));

    let outcome = store.connect(WalletProvider::Xumm).await;
    assert_eq!(
        outcome,
        ConnectOutcome::Failed("XUMM sign-in was cancelled by the user".to_string())
    );
}

#[tokio::test]
async fn test_clear_error() {
    let (store, _) = memory_store(registry(
        MockExtension::missing(),
        MockBridge::signing_in(XUMM_KEY),
    ));

    store.connect(WalletProvider::Freighter).await;
    assert_eq!(store.snapshot().status, ConnectionStatus::Error);

    store.clear_error();
    let state = store.snapshot();
    assert_eq!(state.status, ConnectionStatus::Disconnected);
    assert_eq!(state.error, None);

    store.connect(WalletProvider::Xumm).await;
    store.set_error("");
    let state = store.snapshot();
    assert_eq!(state.error.as_deref(), Some("Failed to connect wallet"));

    store.clear_error();
    assert_eq!(store.snapshot().status, ConnectionStatus::Connected);
}

#[tokio::test]
async fn test_switch_account() {
    let (store, _) = memory_store(registry(
        MockExtension::with_address(FREIGHTER_KEY),
        MockBridge::signing_in(XUMM_KEY),
    ));

    store.connect(WalletProvider::Freighter).await;
    store.connect(WalletProvider::Xumm).await;
    assert_eq!(store.snapshot().public_key.as_deref(), Some(XUMM_KEY));

    store.switch_account(FREIGHTER_KEY);
    let state = store.snapshot();
    assert_eq!(state.public_key.as_deref(), Some(FREIGHTER_KEY));
    assert_eq!(state.provider, Some(WalletProvider::Freighter));
    assert_eq!(
        store.sessions().load().map(|s| s.provider),
        Some(WalletProvider::Freighter)
    );

    let before = store.snapshot();
    store.switch_account("GUNKNOWN");
    assert_eq!(*store.snapshot(), *before);
}

#[tokio::test]
async fn test_switch_network_persists_live_connection() {
    let (store, _) = memory_store(registry(
        MockExtension::with_address(FREIGHTER_KEY),
        MockBridge::signing_in(XUMM_KEY),
    ));

    store.switch_network(StellarNetwork::Futurenet);
    assert_eq!(store.snapshot().network, StellarNetwork::Futurenet);
    assert!(store.sessions().load().is_none());

    store.connect(WalletProvider::Freighter).await;
    store.switch_network(StellarNetwork::Mainnet);

    let state = store.snapshot();
    assert_eq!(state.network, StellarNetwork::Mainnet);
    assert!(state.is_connected());
    assert_eq!(
        store.sessions().load().map(|s| s.network),
        Some(StellarNetwork::Mainnet)
    );
}

#[tokio::test]
async fn test_restore_session_adopts_network() {
    let factory = Arc::new(MockBridgeFactory::new(MockBridge::signing_in(XUMM_KEY)));
    let (store, storage) = memory_store(AdapterRegistry::new().with_bridge(factory.clone()));

    SessionStore::new(storage.clone()).save(WalletProvider::Xumm, XUMM_KEY, StellarNetwork::Mainnet);

    let outcome = store.restore_session().await;
    assert_eq!(outcome, Some(ConnectOutcome::Connected(XUMM_KEY.to_string())));

    let state = store.snapshot();
    assert_eq!(state.network, StellarNetwork::Mainnet);
    assert_eq!(state.provider, Some(WalletProvider::Xumm));
    assert_eq!(factory.inits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_restore_without_session() {
    let (store, _) = memory_store(registry(
        MockExtension::with_address(FREIGHTER_KEY),
        MockBridge::signing_in(XUMM_KEY),
    ));

    assert_eq!(store.restore_session().await, None);
    assert_eq!(store.snapshot().status, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_failed_restore_clears_session() {
    let (store, storage) = memory_store(registry(
        MockExtension::missing(),
        MockBridge::signing_in(XUMM_KEY),
    ));

    SessionStore::new(storage.clone()).save(
        WalletProvider::Freighter,
        FREIGHTER_KEY,
        StellarNetwork::Testnet,
    );

    let outcome = store.restore_session().await;
    assert!(matches!(outcome, Some(ConnectOutcome::Failed(_))));

    let state = store.snapshot();
    assert_eq!(state.status, ConnectionStatus::Disconnected);
    assert_eq!(state.provider, None);
    assert_eq!(state.error, None);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_malformed_session_is_ignored() {
    let (store, storage) = memory_store(registry(
        MockExtension::with_address(FREIGHTER_KEY),
        MockBridge::signing_in(XUMM_KEY),
    ));

    storage.set(store.sessions().key(), "{not json").unwrap();

    assert_eq!(store.restore_session().await, None);
    assert_eq!(store.snapshot().status, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_last_connect_wins() {
    let slow_extension = MockExtension {
        delay: Duration::from_millis(200),
        ..MockExtension::with_address(FREIGHTER_KEY)
    };
    let (store, _) = memory_store(registry(slow_extension, MockBridge::signing_in(XUMM_KEY)));

    let (first, second) = tokio::join!(store.connect(WalletProvider::Freighter), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.connect(WalletProvider::Xumm).await
    });

    assert_eq!(first, ConnectOutcome::Superseded);
    assert_eq!(second, ConnectOutcome::Connected(XUMM_KEY.to_string()));

    let state = store.snapshot();
    assert_eq!(state.status, ConnectionStatus::Connected);
    assert_eq!(state.provider, Some(WalletProvider::Xumm));
    assert_eq!(state.public_key.as_deref(), Some(XUMM_KEY));
    assert_eq!(
        store.sessions().load().map(|s| s.public_key),
        Some(XUMM_KEY.to_string())
    );
}

#[tokio::test]
async fn test_disconnect_supersedes_pending_connect() {
    let slow_extension = MockExtension {
        delay: Duration::from_millis(200),
        ..MockExtension::with_address(FREIGHTER_KEY)
    };
    let (store, storage) = memory_store(registry(slow_extension, MockBridge::signing_in(XUMM_KEY)));

    let (outcome, _) = tokio::join!(store.connect(WalletProvider::Freighter), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.disconnect().await
    });

    assert_eq!(outcome, ConnectOutcome::Superseded);
    assert_eq!(store.snapshot().status, ConnectionStatus::Disconnected);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_connect_during_slow_disconnect_wins() {
    let slow_logout = MockBridge {
        logout_delay: Duration::from_millis(200),
        ..MockBridge::signing_in(XUMM_KEY)
    };
    let (store, _) = memory_store(registry(MockExtension::with_address(FREIGHTER_KEY), slow_logout));

    store.connect(WalletProvider::Xumm).await;

    let (_, outcome) = tokio::join!(store.disconnect(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.connect(WalletProvider::Freighter).await
    });

    assert_eq!(outcome, ConnectOutcome::Connected(FREIGHTER_KEY.to_string()));

    let state = store.snapshot();
    assert_eq!(state.status, ConnectionStatus::Connected);
    assert_eq!(state.provider, Some(WalletProvider::Freighter));
    assert_eq!(state.public_key.as_deref(), Some(FREIGHTER_KEY));
    assert_eq!(
        store.sessions().load().map(|s| s.public_key),
        Some(FREIGHTER_KEY.to_string())
    );
}

#[tokio::test]
async fn test_unavailable_storage_does_not_fail_connect() {
    let adapters = Arc::new(registry(
        MockExtension::with_address(FREIGHTER_KEY),
        MockBridge::signing_in(XUMM_KEY),
    ));
    let store = WalletStore::new(
        adapters,
        SessionStore::new(Arc::new(FailingStorage)),
        StellarNetwork::Testnet,
    );

    let outcome = store.connect(WalletProvider::Freighter).await;
    assert_eq!(outcome, ConnectOutcome::Connected(FREIGHTER_KEY.to_string()));

    let state = store.snapshot();
    assert_eq!(state.status, ConnectionStatus::Connected);
    assert_eq!(state.error, None);

    store.switch_network(StellarNetwork::Mainnet);
    assert!(store.snapshot().is_connected());

    assert_eq!(store.restore_session().await, None);

    store.disconnect().await;
    assert_eq!(store.snapshot().status, ConnectionStatus::Disconnected);
}
