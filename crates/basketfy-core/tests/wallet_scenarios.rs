//! End-to-end wallet session scenarios against the scripted provider.

use std::rc::Rc;

use serde_json::json;

use basketfy_core::config::{HEDERA_TESTNET, storage_keys};
use basketfy_core::utils::{KeyValueStorage, MemoryStorage};
use basketfy_core::wallet::mock::MockProvider;
use basketfy_core::wallet::{ProviderEvent, WalletConfig, WalletManager};
use basketfy_core::{GlobalAction, GlobalStore, ProviderError, WalletError, WalletKind, WalletState};

const ACCOUNT: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
const ACCOUNT_CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

type Manager = WalletManager<MockProvider, Rc<MemoryStorage>>;

fn setup(providers: Vec<Rc<MockProvider>>) -> (Manager, Rc<MemoryStorage>) {
    let storage = Rc::new(MemoryStorage::new());
    let config = WalletConfig {
        network: HEDERA_TESTNET,
        vault: None,
        token_decimals: 18,
    };
    let manager = WalletManager::new(config, storage.clone());
    manager.initialize(providers);
    (manager, storage)
}

#[tokio::test]
async fn test_no_extension_installed() {
    let (wallet, storage) = setup(Vec::new());

    let err = wallet.connect(WalletKind::MetaMask, false).await.unwrap_err();
    assert_eq!(err, WalletError::NotFound(WalletKind::MetaMask));
    assert!(err.to_string().starts_with("MetaMask not found"));
    assert_eq!(wallet.state(), WalletState::Disconnected);
    assert_eq!(storage.write_count(), 0);
}

#[tokio::test]
async fn test_wrong_network_adds_chain_then_connects() {
    let provider = Rc::new(MockProvider::metamask());
    provider.set_accounts(&[ACCOUNT]);
    provider.push_response(
        "wallet_switchEthereumChain",
        Err(ProviderError::new(4902, "Unrecognized chain ID \"0x128\".")),
    );
    let (wallet, storage) = setup(vec![provider.clone()]);

    let address = wallet.connect(WalletKind::MetaMask, false).await.unwrap();
    assert_eq!(address, ACCOUNT_CHECKSUMMED);

    assert_eq!(
        provider.methods(),
        [
            "wallet_switchEthereumChain",
            "wallet_addEthereumChain",
            "eth_requestAccounts",
            "eth_chainId",
        ]
    );
    let (_, add_params) = &provider.calls()[1];
    assert_eq!(
        add_params[0],
        json!({
            "chainId": "0x128",
            "chainName": "Hedera Testnet",
            "rpcUrls": ["https://testnet.hashio.io/api"],
            "nativeCurrency": { "name": "HBAR", "symbol": "HBAR", "decimals": 18 },
            "blockExplorerUrls": ["https://hashscan.io/testnet"],
        })
    );

    assert!(wallet.state().is_connected());
    assert_eq!(
        storage.get_item(storage_keys::WALLET_ADDRESS).unwrap().as_deref(),
        Some(ACCOUNT_CHECKSUMMED)
    );
}

#[tokio::test]
async fn test_add_chain_rejected_fails_connect() {
    let provider = Rc::new(MockProvider::metamask());
    provider.set_accounts(&[ACCOUNT]);
    provider.push_response(
        "wallet_switchEthereumChain",
        Err(ProviderError::new(4902, "Unrecognized chain ID")),
    );
    provider.push_response(
        "wallet_addEthereumChain",
        Err(ProviderError::new(4001, "User rejected the request.")),
    );
    let (wallet, _) = setup(vec![provider.clone()]);

    let err = wallet.connect(WalletKind::MetaMask, false).await.unwrap_err();
    assert!(matches!(err, WalletError::AddChain(_)));
    assert_eq!(provider.call_count("eth_requestAccounts"), 0);
    assert_eq!(wallet.state(), WalletState::Disconnected);
}

#[tokio::test]
async fn test_restore_then_account_loss() {
    let provider = Rc::new(MockProvider::metamask());
    provider.set_accounts(&[ACCOUNT]);
    let (wallet, storage) = setup(vec![provider.clone()]);
    storage
        .set_item(storage_keys::WALLET_ADDRESS, ACCOUNT)
        .unwrap();

    assert!(wallet.restore_if_possible().await);
    assert_eq!(provider.call_count("eth_requestAccounts"), 0);
    assert_eq!(wallet.state().address(), ACCOUNT_CHECKSUMMED);

    provider.emit(ProviderEvent::AccountsChanged, json!([]));
    assert_eq!(wallet.state(), WalletState::Disconnected);
    assert!(!storage.contains(storage_keys::WALLET_ADDRESS));
    assert!(!storage.contains(storage_keys::WALLET_TYPE));
    assert_eq!(provider.listener_count(), 0);
}

#[tokio::test]
async fn test_restore_with_revoked_authorization() {
    let provider = Rc::new(MockProvider::metamask());
    let (wallet, storage) = setup(vec![provider]);
    storage
        .set_item(storage_keys::WALLET_ADDRESS, ACCOUNT)
        .unwrap();

    assert!(!wallet.restore_if_possible().await);
    assert_eq!(wallet.state(), WalletState::Disconnected);
    assert!(!storage.contains(storage_keys::WALLET_ADDRESS));
}

#[tokio::test]
async fn test_store_follows_wallet() {
    let provider = Rc::new(MockProvider::metamask());
    provider.set_accounts(&[ACCOUNT]);
    let (wallet, _) = setup(vec![provider.clone()]);

    let store = Rc::new(GlobalStore::rehydrate(MemoryStorage::new()));
    let mirror = store.clone();
    wallet.on_change(move |change| mirror.dispatch_all(GlobalAction::mirror_wallet(&change)));

    wallet.connect(WalletKind::MetaMask, false).await.unwrap();
    let state = store.state();
    assert!(state.wallet_connected);
    assert_eq!(state.wallet_name, "MetaMask");
    assert_eq!(state.formatted_address, "0x5a...eAed");

    provider.emit(ProviderEvent::Disconnect, json!(null));
    assert!(!store.state().wallet_connected);
}

#[tokio::test]
async fn test_failed_connect_keeps_role_profile() {
    let provider = Rc::new(MockProvider::metamask());
    provider.push_response(
        "eth_requestAccounts",
        Err(ProviderError::new(4001, "User rejected the request.")),
    );
    let (wallet, _) = setup(vec![provider.clone()]);

    let store = Rc::new(GlobalStore::rehydrate(MemoryStorage::new()));
    store.dispatch(GlobalAction::SetUserData(json!({"id": 7, "name": "ada"})));
    let mirror = store.clone();
    wallet.on_change(move |change| mirror.dispatch_all(GlobalAction::mirror_wallet(&change)));

    let err = wallet.connect(WalletKind::MetaMask, false).await.unwrap_err();
    assert!(matches!(err, WalletError::Provider(_)));

    let state = store.state();
    assert!(!state.wallet_connected);
    assert_eq!(state.user_data(), Some(&json!({"id": 7, "name": "ada"})));
}

#[tokio::test]
async fn test_stale_restore_keeps_role_profile() {
    let provider = Rc::new(MockProvider::metamask());
    let (wallet, storage) = setup(vec![provider]);
    storage
        .set_item(storage_keys::WALLET_ADDRESS, ACCOUNT)
        .unwrap();

    let store = Rc::new(GlobalStore::rehydrate(MemoryStorage::new()));
    store.dispatch(GlobalAction::SetFeederData(json!({"did": "did:hedera:1"})));
    let mirror = store.clone();
    wallet.on_change(move |change| mirror.dispatch_all(GlobalAction::mirror_wallet(&change)));

    assert!(!wallet.restore_if_possible().await);
    assert_eq!(store.state().feeder_data(), Some(&json!({"did": "did:hedera:1"})));
}

#[tokio::test]
async fn test_disconnect_drops_role_profile() {
    let provider = Rc::new(MockProvider::metamask());
    provider.set_accounts(&[ACCOUNT]);
    let (wallet, _) = setup(vec![provider]);

    let store = Rc::new(GlobalStore::rehydrate(MemoryStorage::new()));
    let mirror = store.clone();
    wallet.on_change(move |change| mirror.dispatch_all(GlobalAction::mirror_wallet(&change)));

    wallet.connect(WalletKind::MetaMask, false).await.unwrap();
    store.dispatch(GlobalAction::SetUserData(json!({"id": 7})));
    wallet.disconnect();
    assert!(store.state().role.is_none());
}
