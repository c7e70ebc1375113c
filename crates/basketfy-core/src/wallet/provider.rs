//! EIP-1193 provider abstraction.

use std::rc::Rc;

use serde_json::Value;

use crate::error::ProviderError;
use crate::models::WalletKind;

/// Events a provider emits after a session is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEvent {
    AccountsChanged,
    ChainChanged,
    Disconnect,
}

impl ProviderEvent {
    pub const ALL: [ProviderEvent; 3] = [
        ProviderEvent::AccountsChanged,
        ProviderEvent::ChainChanged,
        ProviderEvent::Disconnect,
    ];

    /// Event name passed to `provider.on(...)`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderEvent::AccountsChanged => "accountsChanged",
            ProviderEvent::ChainChanged => "chainChanged",
            ProviderEvent::Disconnect => "disconnect",
        }
    }
}

/// Callback receiving the event payload.
pub type EventHandler = Rc<dyn Fn(Value)>;

/// Handle returned by [`Eip1193Provider::on`], used to detach the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Identity flags an injected provider advertises (`isMetaMask`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderFlags {
    pub is_metamask: bool,
    pub is_phantom: bool,
    pub is_hashpack: bool,
}

impl ProviderFlags {
    /// Whether a provider with these flags is the requested wallet.
    ///
    /// Phantom also sets `isMetaMask`, so it is excluded explicitly.
    pub fn matches(&self, kind: WalletKind) -> bool {
        match kind {
            WalletKind::MetaMask => self.is_metamask && !self.is_phantom,
            WalletKind::HashPack => self.is_hashpack,
        }
    }
}

/// An injected EIP-1193 provider.
///
/// Calls are single-threaded; futures are not `Send`.
#[allow(async_fn_in_trait)]
pub trait Eip1193Provider {
    fn flags(&self) -> ProviderFlags;

    /// `provider.request({ method, params })`.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// `provider.on(event, handler)`.
    fn on(&self, event: ProviderEvent, handler: EventHandler) -> Result<ListenerId, ProviderError>;

    /// `provider.removeListener(event, handler)` for a listener added by [`on`](Self::on).
    fn remove_listener(&self, id: ListenerId);
}

/// Pick the provider for `kind` among everything that was injected.
pub fn select_provider<P: Eip1193Provider>(candidates: &[Rc<P>], kind: WalletKind) -> Option<Rc<P>> {
    candidates.iter().find(|p| p.flags().matches(kind)).cloned()
}
