//! Header wallet badge.
//!
//! Disconnected: one connect button per supported wallet. Connected: the
//! shortened address, the active role and a disconnect button. Every button
//! is disabled while a connect is in flight.

use leptos::prelude::*;

use crate::app::AppContext;
use basketfy_core::{Role, WalletKind, WalletState};

fn role_label(role: &Role) -> Option<&'static str> {
    match role {
        Role::None => None,
        Role::Curator(_) => Some("Curator"),
        Role::User(_) => Some("User"),
        Role::Feeder(_) => Some("Feeder"),
    }
}

#[component]
pub fn WalletBadge() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");

    let connecting = Signal::derive(move || ctx.wallet.with(WalletState::is_connecting));
    let label = Signal::derive(move || ctx.wallet.with(WalletState::display_name));
    let role = Signal::derive(move || ctx.global.with(|g| role_label(&g.role)));

    let connect_button = move |kind: WalletKind| {
        view! {
            <button
                class="wallet-connect"
                disabled=connecting
                on:click=move |_| ctx.connect(kind)
            >
                {kind.display_name()}
            </button>
        }
    };

    view! {
        <div class="wallet-badge">
            {move || {
                if ctx.wallet.with(WalletState::is_connected) {
                    view! {
                        <span class="wallet-address" title=move || ctx.wallet.with(|w| w.address().to_string())>
                            {label}
                        </span>
                        {move || role.get().map(|r| view! { <span class="wallet-role">{r}</span> })}
                        <button class="wallet-disconnect" on:click=move |_| ctx.disconnect()>
                            "Disconnect"
                        </button>
                    }
                    .into_any()
                } else {
                    view! {
                        <span class="wallet-status">{label}</span>
                        {connect_button(WalletKind::MetaMask)}
                        {connect_button(WalletKind::HashPack)}
                    }
                    .into_any()
                }
            }}
            {move || {
                ctx.wallet_error
                    .get()
                    .map(|message| view! { <p class="wallet-error">{message}</p> })
            }}
        </div>
    }
}
