//! Root application module.
//!
//! Builds the [`AppContext`] (persisted store, wallet session) before the
//! first render and restores the previous wallet session on mount.

use std::rc::Rc;

use basketfy_core::utils::BrowserStorage;
use basketfy_core::wallet::BrowserProvider;
use basketfy_core::{GlobalAction, GlobalState, GlobalStore, WalletKind, WalletManager, WalletState};
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::components::{ThemeToggle, WalletBadge};

type Wallet = WalletManager<BrowserProvider, BrowserStorage>;
type Store = Rc<GlobalStore<BrowserStorage>>;

// ============================================================================
// AppContext
// ============================================================================

/// Application-wide reactive context.
///
/// Signals mirror the store and the wallet manager; components read the
/// signals and go through the methods below for every mutation.
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Persisted UI/session record.
    pub global: RwSignal<GlobalState>,
    /// Wallet connection state.
    pub wallet: RwSignal<WalletState>,
    /// Last connect failure, shown inline next to the wallet badge.
    pub wallet_error: RwSignal<Option<String>>,
    manager: StoredValue<Wallet, LocalStorage>,
    store: StoredValue<Store, LocalStorage>,
}

impl AppContext {
    /// Rehydrate the store and wire the wallet manager into it.
    pub fn new() -> Self {
        let store: Store = Rc::new(GlobalStore::browser());
        let global = RwSignal::new(store.state());
        store.subscribe(move |state| global.set(state.clone()));

        let manager = Wallet::browser();
        let wallet = RwSignal::new(manager.state());
        let mirror = Rc::clone(&store);
        manager.on_change(move |change| {
            mirror.dispatch_all(GlobalAction::mirror_wallet(&change));
            wallet.set(change.to);
        });

        Self {
            global,
            wallet,
            wallet_error: RwSignal::new(None),
            manager: StoredValue::new_local(manager),
            store: StoredValue::new_local(store),
        }
    }

    pub fn dispatch(&self, action: GlobalAction) {
        self.store.with_value(|store| store.dispatch(action));
    }

    /// Silently reconnect the wallet used before the last reload.
    pub fn restore_session(&self) {
        let manager = self.manager.get_value();
        spawn_local(async move {
            manager.restore_if_possible().await;
        });
    }

    pub fn connect(&self, kind: WalletKind) {
        let manager = self.manager.get_value();
        let error = self.wallet_error;
        error.set(None);
        spawn_local(async move {
            if let Err(e) = manager.connect(kind, false).await {
                error.set(Some(e.to_string()));
            }
        });
    }

    pub fn disconnect(&self) {
        self.wallet_error.set(None);
        self.manager.with_value(|manager| manager.disconnect());
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Root application component.
#[component]
pub fn App() -> impl IntoView {
    let ctx = AppContext::new();
    provide_context(ctx);

    // Runs once after mount: no signal is tracked.
    Effect::new(move || ctx.restore_session());

    let theme = move || {
        if ctx.global.with(|g| g.is_dark_mode) {
            "app dark"
        } else {
            "app"
        }
    };

    view! {
        <div class=theme>
            <header class="app-header">
                <span class="app-title">"Basketfy"</span>
                <ThemeToggle />
                <WalletBadge />
            </header>
        </div>
    }
}
