//! Wallet session manager.
//!
//! [`WalletManager`] owns the one live [`WalletSession`] (provider, signing
//! account, vault binding, event subscription). The rest of the app reads it
//! through [`WalletManager::state`] and drives it through a handful of
//! commands; none of them panic or surface foreign error types.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ok──▶ Connected
//!       ▲                        │                 │
//!       └───────── failure ──────┘   disconnect /  │
//!       └──────────────── empty accountsChanged ───┘
//! ```

mod browser;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod provider;
mod subscription;
mod vault;

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

use alloy_primitives::{Address, U256};
use serde_json::{Value, json};

use crate::config::{
    DEFAULT_TOKEN_DECIMALS, HEDERA_TESTNET, NetworkConfig, storage_keys, vault_contract_address,
};
use crate::error::WalletError;
use crate::models::{FeederInfo, TxOutcome, WalletKind, WalletState, WalletTransition};
use crate::utils::dom;
use crate::utils::storage::{BrowserStorage, KeyValueStorage};
use crate::utils::units::{format_amount, parse_amount};

pub use browser::BrowserProvider;
pub use provider::{
    Eip1193Provider, EventHandler, ListenerId, ProviderEvent, ProviderFlags, select_provider,
};
pub use subscription::Subscription;
pub use vault::{IERC20, IFeedersVault, VaultContract};

/// Deployment parameters for a [`WalletManager`].
#[derive(Debug, Clone, Copy)]
pub struct WalletConfig {
    /// Network every connect switches to.
    pub network: NetworkConfig,
    /// Vault contract; `None` skips the contract binding.
    pub vault: Option<Address>,
    pub token_decimals: u8,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: HEDERA_TESTNET,
            vault: vault_contract_address(),
            token_decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

/// Everything that exists only while connected.
pub struct WalletSession<P: Eip1193Provider> {
    pub kind: WalletKind,
    pub address: Address,
    pub chain_id: String,
    provider: Rc<P>,
    vault: Option<VaultContract<P>>,
    _subscription: Subscription<P>,
}

type ChangeHook = Rc<dyn Fn(WalletTransition)>;
type ReloadHook = Rc<dyn Fn()>;

struct Shared<P: Eip1193Provider, S> {
    config: WalletConfig,
    storage: S,
    candidates: RefCell<Vec<Rc<P>>>,
    connecting: Cell<bool>,
    session: RefCell<Option<WalletSession<P>>>,
    on_change: RefCell<Option<ChangeHook>>,
    settled: RefCell<WalletState>,
    reload: RefCell<ReloadHook>,
}

/// Handle to the wallet session. Clones share the same session.
pub struct WalletManager<P: Eip1193Provider, S> {
    shared: Rc<Shared<P, S>>,
}

impl<P: Eip1193Provider, S> Clone for WalletManager<P, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl WalletManager<BrowserProvider, BrowserStorage> {
    /// Manager over the injected providers, persisting to sessionStorage.
    pub fn browser() -> Self {
        let manager = Self::new(WalletConfig::default(), BrowserStorage::session());
        manager.initialize(BrowserProvider::detect());
        manager
    }
}

impl<P, S> WalletManager<P, S>
where
    P: Eip1193Provider + 'static,
    S: KeyValueStorage + 'static,
{
    pub fn new(config: WalletConfig, storage: S) -> Self {
        Self {
            shared: Rc::new(Shared {
                config,
                storage,
                candidates: RefCell::new(Vec::new()),
                connecting: Cell::new(false),
                session: RefCell::new(None),
                on_change: RefCell::new(None),
                settled: RefCell::new(WalletState::Disconnected),
                reload: RefCell::new(Rc::new(dom::reload_page) as ReloadHook),
            }),
        }
    }

    /// Called after every transition with the last settled state and the
    /// new one.
    pub fn on_change(&self, hook: impl Fn(WalletTransition) + 'static) {
        let hook: ChangeHook = Rc::new(hook);
        *self.shared.on_change.borrow_mut() = Some(hook);
    }

    /// Replace the page reload triggered by `chainChanged`.
    pub fn on_reload(&self, hook: impl Fn() + 'static) {
        *self.shared.reload.borrow_mut() = Rc::new(hook);
    }

    pub fn storage(&self) -> &S {
        &self.shared.storage
    }

    /// Record the injected providers. With none, the manager stays
    /// disconnected and restoration is skipped.
    pub fn initialize(&self, candidates: Vec<Rc<P>>) {
        if candidates.is_empty() {
            log::info!("no wallet provider injected");
        }
        *self.shared.candidates.borrow_mut() = candidates;
    }

    pub fn has_provider(&self) -> bool {
        !self.shared.candidates.borrow().is_empty()
    }

    pub fn state(&self) -> WalletState {
        if self.shared.connecting.get() {
            return WalletState::Connecting;
        }
        match self.shared.session.borrow().as_ref() {
            Some(session) => WalletState::Connected {
                address: session.address.to_string(),
                chain_id: session.chain_id.clone(),
                wallet: session.kind,
            },
            None => WalletState::Disconnected,
        }
    }

    pub fn is_connecting(&self) -> bool {
        self.shared.connecting.get()
    }

    pub fn address(&self) -> Option<Address> {
        self.shared.session.borrow().as_ref().map(|s| s.address)
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Silently reconnect the wallet persisted by a previous page load.
    ///
    /// Never fails: any error is logged and the persisted entry cleared.
    /// Returns whether a session was restored.
    pub async fn restore_if_possible(&self) -> bool {
        if !self.has_provider() {
            return false;
        }

        let storage = &self.shared.storage;
        let persisted = match storage.get_item(storage_keys::WALLET_ADDRESS) {
            Ok(Some(address)) => address,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("cannot read persisted wallet: {e}");
                return false;
            }
        };
        let kind = storage
            .get_item(storage_keys::WALLET_TYPE)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse::<WalletKind>().ok())
            .unwrap_or_default();

        match self.connect(kind, true).await {
            Ok(address) => {
                log::info!("restored {kind} session for {address}");
                true
            }
            Err(WalletError::ConnectInProgress) => false,
            Err(e) => {
                log::warn!("failed to restore wallet {persisted}: {e}");
                self.clear_persisted();
                false
            }
        }
    }

    /// Connect `kind`, switching to the configured network first.
    ///
    /// With `skip_prompt`, only already-authorized accounts are used. A call
    /// made while another connect is in flight is rejected. On failure any
    /// previous session is left untouched.
    pub async fn connect(&self, kind: WalletKind, skip_prompt: bool) -> Result<String, WalletError> {
        if self.shared.connecting.get() {
            log::warn!("connect ignored: already connecting");
            return Err(WalletError::ConnectInProgress);
        }

        let result = {
            let _guard = ConnectingGuard::enter(&self.shared.connecting);
            self.notify();
            self.establish(kind, skip_prompt).await
        };

        match &result {
            Ok(address) => log::info!("{kind} connected: {address}"),
            Err(e) => log::warn!("{kind} connect failed: {e}"),
        }
        self.notify();
        result
    }

    async fn establish(&self, kind: WalletKind, skip_prompt: bool) -> Result<String, WalletError> {
        let provider = select_provider(&self.shared.candidates.borrow(), kind)
            .ok_or(WalletError::NotFound(kind))?;

        self.ensure_network(&provider).await?;

        let method = if skip_prompt {
            "eth_accounts"
        } else {
            "eth_requestAccounts"
        };
        let accounts = provider.request(method, json!([])).await?;
        let Some(first) = first_account(&accounts) else {
            return Err(if skip_prompt {
                WalletError::NotAuthorized(kind)
            } else {
                WalletError::NoAccount
            });
        };
        let address = parse_address(&first)?;

        let chain_id = match provider.request("eth_chainId", json!([])).await {
            Ok(Value::String(id)) => id,
            _ => self.shared.config.network.chain_id_hex(),
        };

        let config = self.shared.config;
        let vault = config
            .vault
            .map(|at| VaultContract::new(provider.clone(), at, config.token_decimals).with_signer(address));

        self.persist(address, kind);

        // Tear down the previous session's listeners before adding new ones.
        let previous = self.shared.session.borrow_mut().take();
        drop(previous);

        let subscription = match Subscription::register(provider.clone(), self.event_handlers()) {
            Ok(subscription) => subscription,
            Err(e) => {
                self.clear_persisted();
                return Err(e.into());
            }
        };

        *self.shared.session.borrow_mut() = Some(WalletSession {
            kind,
            address,
            chain_id,
            provider,
            vault,
            _subscription: subscription,
        });
        Ok(address.to_string())
    }

    /// `wallet_switchEthereumChain`, falling back to `wallet_addEthereumChain`
    /// when the wallet does not know the network.
    async fn ensure_network(&self, provider: &P) -> Result<(), WalletError> {
        let network = &self.shared.config.network;
        let chain_id = network.chain_id_hex();

        let switched = provider
            .request("wallet_switchEthereumChain", json!([{ "chainId": chain_id }]))
            .await;
        match switched {
            Ok(_) => Ok(()),
            Err(e) if e.is_unrecognized_chain() => {
                log::info!("adding {} to wallet", network.chain_name);
                let params = json!([{
                    "chainId": chain_id,
                    "chainName": network.chain_name,
                    "rpcUrls": [network.rpc_url],
                    "nativeCurrency": {
                        "name": network.native_currency.name,
                        "symbol": network.native_currency.symbol,
                        "decimals": network.native_currency.decimals,
                    },
                    "blockExplorerUrls": [network.block_explorer_url],
                }]);
                provider
                    .request("wallet_addEthereumChain", params)
                    .await
                    .map(|_| ())
                    .map_err(WalletError::AddChain)
            }
            Err(e) => Err(WalletError::SwitchChain(e)),
        }
    }

    /// End the session. Safe to call when already disconnected.
    pub fn disconnect(&self) {
        let Some(session) = self.shared.session.borrow_mut().take() else {
            return;
        };
        // Detaches the provider listeners.
        drop(session);

        self.clear_persisted();
        log::info!("wallet disconnected");
        self.notify();
    }

    // =========================================================================
    // Provider events
    // =========================================================================

    fn event_handlers(&self) -> Vec<(ProviderEvent, EventHandler)> {
        ProviderEvent::ALL
            .into_iter()
            .map(|event| {
                let weak: Weak<Shared<P, S>> = Rc::downgrade(&self.shared);
                let handler: EventHandler = Rc::new(move |payload: Value| {
                    if let Some(shared) = weak.upgrade() {
                        WalletManager { shared }.handle_event(event, payload);
                    }
                });
                (event, handler)
            })
            .collect()
    }

    fn handle_event(&self, event: ProviderEvent, payload: Value) {
        log::debug!("provider event {}: {payload}", event.as_str());
        match event {
            ProviderEvent::AccountsChanged => self.accounts_changed(&payload),
            ProviderEvent::ChainChanged => {
                log::info!("chain changed to {payload}, reloading");
                let reload = Rc::clone(&self.shared.reload.borrow());
                reload();
            }
            ProviderEvent::Disconnect => self.disconnect(),
        }
    }

    fn accounts_changed(&self, accounts: &Value) {
        let Some(first) = first_account(accounts) else {
            self.disconnect();
            return;
        };
        let address = match parse_address(&first) {
            Ok(address) => address,
            Err(e) => {
                log::warn!("ignoring accountsChanged: {e}");
                return;
            }
        };

        let kind = {
            let mut session = self.shared.session.borrow_mut();
            let Some(session) = session.as_mut() else {
                return;
            };
            session.address = address;
            if let Some(vault) = session.vault.as_mut() {
                vault.set_signer(address);
            }
            session.kind
        };

        self.persist(address, kind);
        log::info!("account changed to {address}");
        self.notify();
    }

    // =========================================================================
    // Contract writes
    // =========================================================================

    fn signer_vault(&self) -> Result<VaultContract<P>, WalletError> {
        self.shared
            .session
            .borrow()
            .as_ref()
            .and_then(|s| s.vault.clone())
            .filter(|v| v.signer().is_some())
            .ok_or(WalletError::NotConnected)
    }

    pub async fn register_feeder(&self, did: &str, feeder: &str) -> Result<TxOutcome, WalletError> {
        let vault = self.signer_vault()?;
        if did.trim().is_empty() {
            return Err(WalletError::MissingParameter("did"));
        }
        let feeder = parse_address(feeder)?;
        logged("registerFeeder", vault.register_feeder(did.trim(), feeder).await)
    }

    /// Approve and deposit `amount` (human-decimal) of `stablecoin`.
    pub async fn deposit_liquidity(
        &self,
        feeder: &str,
        stablecoin: &str,
        amount: &str,
    ) -> Result<TxOutcome, WalletError> {
        let vault = self.signer_vault()?;
        let feeder = parse_address(feeder)?;
        let stablecoin = parse_address(stablecoin)?;
        let amount = parse_amount(amount, self.shared.config.token_decimals)?;
        logged(
            "depositLiquidity",
            vault.deposit_liquidity(feeder, stablecoin, amount).await,
        )
    }

    pub async fn withdraw_liquidity(
        &self,
        feeder: &str,
        stablecoin: &str,
        amount: &str,
    ) -> Result<TxOutcome, WalletError> {
        let vault = self.signer_vault()?;
        let feeder = parse_address(feeder)?;
        let stablecoin = parse_address(stablecoin)?;
        let amount = parse_amount(amount, self.shared.config.token_decimals)?;
        logged(
            "withdrawLiquidity",
            vault.withdraw_liquidity(feeder, stablecoin, amount).await,
        )
    }

    pub async fn claim_yield(&self, feeder: &str) -> Result<TxOutcome, WalletError> {
        let vault = self.signer_vault()?;
        let feeder = parse_address(feeder)?;
        logged("claimYield", vault.claim_yield(feeder).await)
    }

    // =========================================================================
    // Contract reads
    // =========================================================================

    /// Vault binding for reads: the session's, else a provider-only one.
    fn read_vault(&self) -> Result<VaultContract<P>, WalletError> {
        if let Some(vault) = self
            .shared
            .session
            .borrow()
            .as_ref()
            .and_then(|s| s.vault.clone())
        {
            return Ok(vault);
        }

        let config = self.shared.config;
        let at = config.vault.ok_or(WalletError::ContractUnavailable)?;
        let provider = self
            .read_provider()
            .ok_or(WalletError::ContractUnavailable)?;
        Ok(VaultContract::new(provider, at, config.token_decimals))
    }

    fn read_provider(&self) -> Option<Rc<P>> {
        if let Some(session) = self.shared.session.borrow().as_ref() {
            return Some(Rc::clone(&session.provider));
        }
        let candidates = self.shared.candidates.borrow();
        select_provider(&candidates, WalletKind::default()).or_else(|| candidates.first().cloned())
    }

    async fn read<T, F, Fut>(&self, what: &str, f: F) -> Option<T>
    where
        F: FnOnce(VaultContract<P>) -> Fut,
        Fut: Future<Output = Result<T, WalletError>>,
    {
        let result = match self.read_vault() {
            Ok(vault) => f(vault).await,
            Err(e) => Err(e),
        };
        result.inspect_err(|e| log::warn!("{what} failed: {e}")).ok()
    }

    /// Accrued yield for `feeder`, human-decimal.
    pub async fn calculate_yield(&self, feeder: &str) -> Option<String> {
        let feeder = parse_address(feeder).ok()?;
        let decimals = self.shared.config.token_decimals;
        self.read("calculateYield", |vault| async move {
            vault
                .calculate_yield(feeder)
                .await
                .map(|v| format_amount(v, decimals))
        })
        .await
    }

    pub async fn get_feeder_info(&self, feeder: &str) -> Option<FeederInfo> {
        let feeder = parse_address(feeder).ok()?;
        self.read("getFeederInfo", |vault| async move { vault.feeder_info(feeder).await })
            .await
    }

    pub async fn get_total_feeder_liquidity(&self) -> Option<String> {
        let decimals = self.shared.config.token_decimals;
        self.read("getTotalFeederLiquidity", |vault| async move {
            vault
                .total_feeder_liquidity()
                .await
                .map(|v| format_amount(v, decimals))
        })
        .await
    }

    /// Yield rate in basis points.
    pub async fn get_yield_rate(&self) -> Option<U256> {
        self.read("yieldRate", |vault| async move { vault.yield_rate().await })
            .await
    }

    /// Feeder address registered for `did`; `None` when unregistered.
    pub async fn get_address_by_did(&self, did: &str) -> Option<String> {
        let did = did.to_string();
        self.read("didToAddress", |vault| async move { vault.address_by_did(&did).await })
            .await
            .filter(|address| !address.is_zero())
            .map(|address| address.to_string())
    }

    pub async fn is_feeder_verified(&self, feeder: &str) -> bool {
        self.get_feeder_info(feeder)
            .await
            .is_some_and(|info| info.verified)
    }

    /// ERC-20 balance of `owner`, human-decimal. `"0"` on any failure.
    pub async fn token_balance(&self, token: &str, owner: &str) -> String {
        let (Ok(token), Ok(owner)) = (parse_address(token), parse_address(owner)) else {
            log::warn!("token balance: invalid address {token} / {owner}");
            return "0".to_string();
        };
        let decimals = self.shared.config.token_decimals;
        self.read("balanceOf", |vault| async move {
            vault
                .token_balance(token, owner)
                .await
                .map(|v| format_amount(v, decimals))
        })
        .await
        .unwrap_or_else(|| "0".to_string())
    }

    // =========================================================================
    // Persistence / notification
    // =========================================================================

    fn persist(&self, address: Address, kind: WalletKind) {
        let storage = &self.shared.storage;
        let written = storage
            .set_item(storage_keys::WALLET_ADDRESS, &address.to_string())
            .and_then(|()| storage.set_item(storage_keys::WALLET_TYPE, kind.as_str()));
        if let Err(e) = written {
            log::warn!("failed to persist wallet session: {e}");
        }
    }

    fn clear_persisted(&self) {
        for key in [storage_keys::WALLET_ADDRESS, storage_keys::WALLET_TYPE] {
            if let Err(e) = self.shared.storage.remove_item(key) {
                log::warn!("failed to clear {key}: {e}");
            }
        }
    }

    fn notify(&self) {
        let to = self.state();
        let from = if to.is_connecting() {
            self.shared.settled.borrow().clone()
        } else {
            self.shared.settled.replace(to.clone())
        };
        let hook = self.shared.on_change.borrow().clone();
        if let Some(hook) = hook {
            hook(WalletTransition { from, to });
        }
    }
}

/// Holds the `connecting` flag for the duration of one connect sequence.
struct ConnectingGuard<'a>(&'a Cell<bool>);

impl<'a> ConnectingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn first_account(accounts: &Value) -> Option<String> {
    accounts
        .as_array()?
        .first()?
        .as_str()
        .map(str::to_string)
}

fn parse_address(raw: &str) -> Result<Address, WalletError> {
    raw.trim()
        .parse()
        .map_err(|_| WalletError::InvalidAddress(raw.to_string()))
}

fn logged(call: &str, result: Result<TxOutcome, WalletError>) -> Result<TxOutcome, WalletError> {
    match &result {
        Ok(outcome) => log::info!("{call} mined in {}", outcome.tx_hash),
        Err(e) => log::error!("{call} failed: {e}"),
    }
    result
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    use alloy_primitives::address;
    use alloy_sol_types::SolValue;

    use super::*;
    use crate::error::ProviderError;
    use crate::utils::storage::MemoryStorage;
    use crate::wallet::mock::MockProvider;

    const ACCOUNT: &str = "0x00000000000000000000000000000000000000a1";
    const OTHER: &str = "0x00000000000000000000000000000000000000b2";
    const VAULT: Address = address!("00000000000000000000000000000000000000ff");
    const TOKEN: &str = "0x00000000000000000000000000000000000000c3";

    fn checksummed(raw: &str) -> String {
        raw.parse::<Address>().unwrap().to_string()
    }

    fn manager(provider: &Rc<MockProvider>) -> WalletManager<MockProvider, Rc<MemoryStorage>> {
        let config = WalletConfig {
            network: HEDERA_TESTNET,
            vault: Some(VAULT),
            token_decimals: 18,
        };
        let manager = WalletManager::new(config, Rc::new(MemoryStorage::new()));
        manager.initialize(vec![provider.clone()]);
        manager
    }

    fn authorized_provider() -> Rc<MockProvider> {
        let provider = Rc::new(MockProvider::metamask());
        provider.set_accounts(&[ACCOUNT]);
        provider
    }

    #[tokio::test]
    async fn test_connect_persists_and_subscribes() {
        let provider = authorized_provider();
        let wallet = manager(&provider);

        let address = wallet.connect(WalletKind::MetaMask, false).await.unwrap();
        assert_eq!(address, checksummed(ACCOUNT));
        assert_eq!(
            wallet.state(),
            WalletState::Connected {
                address: checksummed(ACCOUNT),
                chain_id: "0x128".to_string(),
                wallet: WalletKind::MetaMask,
            }
        );
        assert_eq!(
            wallet.storage().get_item(storage_keys::WALLET_ADDRESS).unwrap(),
            Some(checksummed(ACCOUNT))
        );
        assert_eq!(
            wallet.storage().get_item(storage_keys::WALLET_TYPE).unwrap(),
            Some("metamask".to_string())
        );
        assert_eq!(provider.listener_count(), 3);
        assert_eq!(
            provider.methods(),
            ["wallet_switchEthereumChain", "eth_requestAccounts", "eth_chainId"]
        );
    }

    #[tokio::test]
    async fn test_reconnect_does_not_duplicate_listeners() {
        let provider = authorized_provider();
        let wallet = manager(&provider);

        wallet.connect(WalletKind::MetaMask, false).await.unwrap();
        wallet.connect(WalletKind::MetaMask, false).await.unwrap();
        assert_eq!(provider.listener_count(), 3);
    }

    #[tokio::test]
    async fn test_listener_registration_failure_cleans_up() {
        let provider = authorized_provider();
        provider.fail_listener_registration_after(1);
        let wallet = manager(&provider);

        let err = wallet.connect(WalletKind::MetaMask, false).await.unwrap_err();
        assert!(matches!(err, WalletError::Provider(_)));
        assert_eq!(provider.listener_count(), 0);
        assert!(!wallet.storage().contains(storage_keys::WALLET_ADDRESS));
        assert!(!wallet.storage().contains(storage_keys::WALLET_TYPE));
        assert_eq!(wallet.state(), WalletState::Disconnected);
        assert!(!wallet.is_connecting());
    }

    #[tokio::test]
    async fn test_listener_registration_failure_on_reconnect_drops_old_session() {
        let provider = authorized_provider();
        let wallet = manager(&provider);
        wallet.connect(WalletKind::MetaMask, false).await.unwrap();
        assert_eq!(provider.listener_count(), 3);

        provider.fail_listener_registration_after(1);
        assert!(wallet.connect(WalletKind::MetaMask, false).await.is_err());
        assert_eq!(provider.listener_count(), 0);
        assert!(!wallet.storage().contains(storage_keys::WALLET_ADDRESS));
        assert!(!wallet.storage().contains(storage_keys::WALLET_TYPE));
        assert_eq!(wallet.state(), WalletState::Disconnected);
        assert_eq!(wallet.address(), None);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let provider = authorized_provider();
        let wallet = manager(&provider);

        wallet.disconnect();
        assert_eq!(wallet.state(), WalletState::Disconnected);
        assert_eq!(wallet.storage().write_count(), 0);

        wallet.connect(WalletKind::MetaMask, false).await.unwrap();
        wallet.disconnect();
        let writes = wallet.storage().write_count();
        assert_eq!(provider.listener_count(), 0);
        assert!(!wallet.storage().contains(storage_keys::WALLET_ADDRESS));

        wallet.disconnect();
        assert_eq!(wallet.storage().write_count(), writes);
        assert_eq!(wallet.state(), WalletState::Disconnected);
    }

    #[test]
    fn test_second_connect_while_pending_is_rejected() {
        let provider = authorized_provider();
        provider.hold("wallet_switchEthereumChain");
        let wallet = manager(&provider);
        let mut cx = Context::from_waker(Waker::noop());

        let mut first = pin!(wallet.connect(WalletKind::MetaMask, false));
        assert!(first.as_mut().poll(&mut cx).is_pending());
        assert_eq!(wallet.state(), WalletState::Connecting);

        let mut second = pin!(wallet.connect(WalletKind::MetaMask, false));
        match second.as_mut().poll(&mut cx) {
            Poll::Ready(result) => assert_eq!(result, Err(WalletError::ConnectInProgress)),
            Poll::Pending => panic!("second connect should resolve immediately"),
        }
        assert_eq!(provider.call_count("wallet_switchEthereumChain"), 1);

        provider.release("wallet_switchEthereumChain");
        match first.as_mut().poll(&mut cx) {
            Poll::Ready(result) => assert_eq!(result, Ok(checksummed(ACCOUNT))),
            Poll::Pending => panic!("first connect should finish once released"),
        }
        assert_eq!(provider.call_count("eth_requestAccounts"), 1);
    }

    #[tokio::test]
    async fn test_restore_without_authorized_accounts() {
        let provider = Rc::new(MockProvider::metamask());
        let wallet = manager(&provider);
        wallet
            .storage()
            .set_item(storage_keys::WALLET_ADDRESS, ACCOUNT)
            .unwrap();

        assert!(!wallet.restore_if_possible().await);
        assert_eq!(wallet.state(), WalletState::Disconnected);
        assert!(!wallet.storage().contains(storage_keys::WALLET_ADDRESS));
        assert_eq!(provider.call_count("eth_accounts"), 1);
        assert_eq!(provider.call_count("eth_requestAccounts"), 0);
    }

    #[tokio::test]
    async fn test_restore_uses_persisted_wallet_kind() {
        let provider = Rc::new(MockProvider::hashpack());
        provider.set_accounts(&[ACCOUNT]);
        let wallet = manager(&provider);
        let storage = wallet.storage();
        storage.set_item(storage_keys::WALLET_ADDRESS, ACCOUNT).unwrap();
        storage.set_item(storage_keys::WALLET_TYPE, "hashpack").unwrap();

        assert!(wallet.restore_if_possible().await);
        assert!(matches!(
            wallet.state(),
            WalletState::Connected { wallet: WalletKind::HashPack, .. }
        ));
    }

    #[tokio::test]
    async fn test_restore_skipped_without_provider() {
        let wallet: WalletManager<MockProvider, _> =
            WalletManager::new(WalletConfig::default(), MemoryStorage::new());
        wallet
            .storage()
            .set_item(storage_keys::WALLET_ADDRESS, ACCOUNT)
            .unwrap();

        assert!(!wallet.restore_if_possible().await);
        assert!(wallet.storage().contains(storage_keys::WALLET_ADDRESS));
    }

    #[tokio::test]
    async fn test_empty_accounts_changed_disconnects() {
        let provider = authorized_provider();
        let wallet = manager(&provider);
        wallet.connect(WalletKind::MetaMask, false).await.unwrap();

        provider.emit(ProviderEvent::AccountsChanged, json!([]));

        assert_eq!(wallet.state(), WalletState::Disconnected);
        assert!(!wallet.storage().contains(storage_keys::WALLET_ADDRESS));
        assert_eq!(provider.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_accounts_changed_switches_identity() {
        let provider = authorized_provider();
        let wallet = manager(&provider);
        wallet.connect(WalletKind::MetaMask, false).await.unwrap();

        provider.emit(ProviderEvent::AccountsChanged, json!([OTHER]));

        assert_eq!(wallet.state().address(), checksummed(OTHER));
        assert_eq!(
            wallet.storage().get_item(storage_keys::WALLET_ADDRESS).unwrap(),
            Some(checksummed(OTHER))
        );

        wallet.claim_yield(OTHER).await.unwrap();
        let (_, params) = provider
            .calls()
            .into_iter()
            .find(|(m, _)| m == "eth_sendTransaction")
            .unwrap();
        assert_eq!(params[0]["from"], checksummed(OTHER));
    }

    #[tokio::test]
    async fn test_chain_changed_reloads() {
        let provider = authorized_provider();
        let wallet = manager(&provider);
        let reloads = Rc::new(Cell::new(0));
        let counter = reloads.clone();
        wallet.on_reload(move || counter.set(counter.get() + 1));
        wallet.connect(WalletKind::MetaMask, false).await.unwrap();

        provider.emit(ProviderEvent::ChainChanged, json!("0x1"));
        assert_eq!(reloads.get(), 1);
    }

    #[tokio::test]
    async fn test_provider_disconnect_event() {
        let provider = authorized_provider();
        let wallet = manager(&provider);
        wallet.connect(WalletKind::MetaMask, false).await.unwrap();

        provider.emit(ProviderEvent::Disconnect, json!({ "code": 1013 }));
        assert_eq!(wallet.state(), WalletState::Disconnected);
    }

    #[tokio::test]
    async fn test_other_switch_error_is_terminal() {
        let provider = authorized_provider();
        provider.push_response(
            "wallet_switchEthereumChain",
            Err(ProviderError::new(4001, "User rejected the request.")),
        );
        let wallet = manager(&provider);

        let err = wallet.connect(WalletKind::MetaMask, false).await.unwrap_err();
        assert!(matches!(err, WalletError::SwitchChain(ref e) if e.is_user_rejected()));
        assert_eq!(provider.call_count("wallet_addEthereumChain"), 0);
        assert_eq!(provider.call_count("eth_requestAccounts"), 0);
        assert_eq!(wallet.state(), WalletState::Disconnected);
    }

    #[tokio::test]
    async fn test_phantom_is_not_metamask() {
        let phantom = Rc::new(MockProvider::with_flags(ProviderFlags {
            is_metamask: true,
            is_phantom: true,
            ..Default::default()
        }));
        let metamask = authorized_provider();
        let wallet = manager(&phantom);
        wallet.initialize(vec![phantom.clone(), metamask.clone()]);

        wallet.connect(WalletKind::MetaMask, false).await.unwrap();
        assert!(phantom.calls().is_empty());
        assert_eq!(metamask.call_count("eth_requestAccounts"), 1);
    }

    #[tokio::test]
    async fn test_state_changes_are_reported() {
        let provider = authorized_provider();
        let wallet = manager(&provider);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        wallet.on_change(move |change| sink.borrow_mut().push(change.to));

        wallet.connect(WalletKind::MetaMask, false).await.unwrap();
        wallet.disconnect();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], WalletState::Connecting);
        assert!(seen[1].is_connected());
        assert_eq!(seen[2], WalletState::Disconnected);
    }

    #[tokio::test]
    async fn test_writes_require_connection() {
        let provider = authorized_provider();
        let wallet = manager(&provider);

        let err = wallet.deposit_liquidity(ACCOUNT, TOKEN, "10").await.unwrap_err();
        assert_eq!(err, WalletError::NotConnected);
        assert_eq!(err.to_string(), "Wallet not connected");
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deposit_converts_amount() {
        let provider = authorized_provider();
        let wallet = manager(&provider);
        wallet.connect(WalletKind::MetaMask, false).await.unwrap();

        wallet.deposit_liquidity(ACCOUNT, TOKEN, "100.5").await.unwrap();

        let call = IFeedersVault::depositLiquidityCall {
            feeder: ACCOUNT.parse().unwrap(),
            stablecoin: TOKEN.parse().unwrap(),
            amount: U256::from(100_500_000_000_000_000_000u128),
        };
        let expected = format!("0x{}", hex::encode(alloy_sol_types::SolCall::abi_encode(&call)));
        let sends: Vec<Value> = provider
            .calls()
            .into_iter()
            .filter(|(m, _)| m == "eth_sendTransaction")
            .map(|(_, p)| p)
            .collect();
        assert_eq!(sends.len(), 2);
        assert_eq!(sends[1][0]["data"], expected);
    }

    #[tokio::test]
    async fn test_write_parameter_validation() {
        let provider = authorized_provider();
        let wallet = manager(&provider);
        wallet.connect(WalletKind::MetaMask, false).await.unwrap();

        assert_eq!(
            wallet.register_feeder("  ", ACCOUNT).await.unwrap_err(),
            WalletError::MissingParameter("did")
        );
        assert!(matches!(
            wallet.withdraw_liquidity("0xnope", TOKEN, "1").await,
            Err(WalletError::InvalidAddress(_))
        ));
        assert!(matches!(
            wallet.withdraw_liquidity(ACCOUNT, TOKEN, "-1").await,
            Err(WalletError::InvalidAmount(_))
        ));
        assert_eq!(provider.call_count("eth_sendTransaction"), 0);
    }

    #[tokio::test]
    async fn test_reads_work_without_signer() {
        let provider = Rc::new(MockProvider::metamask());
        provider.push_response(
            "eth_call",
            Ok(json!(format!(
                "0x{}",
                hex::encode(U256::from(2_000_000_000_000_000_000u128).abi_encode())
            ))),
        );
        let wallet = manager(&provider);

        assert_eq!(wallet.get_total_feeder_liquidity().await.as_deref(), Some("2.0"));
        assert_eq!(wallet.state(), WalletState::Disconnected);
    }

    #[tokio::test]
    async fn test_failed_reads_degrade() {
        let provider = Rc::new(MockProvider::metamask());
        let wallet = manager(&provider);

        assert_eq!(wallet.calculate_yield(ACCOUNT).await, None);
        assert!(!wallet.is_feeder_verified(ACCOUNT).await);
        assert_eq!(wallet.token_balance(TOKEN, ACCOUNT).await, "0");
        assert_eq!(wallet.token_balance("bogus", ACCOUNT).await, "0");
    }

    #[tokio::test]
    async fn test_reads_without_contract_are_unavailable() {
        let provider = authorized_provider();
        let wallet = WalletManager::new(
            WalletConfig {
                network: HEDERA_TESTNET,
                vault: None,
                token_decimals: 18,
            },
            MemoryStorage::new(),
        );
        wallet.initialize(vec![provider.clone()]);

        assert_eq!(wallet.get_yield_rate().await, None);
        assert!(provider.calls().is_empty());
    }
}
