use leptos::prelude::*;

use crate::app::AppContext;
use basketfy_core::GlobalAction;

/// Dark mode switch. The choice survives reloads through the store.
#[component]
pub fn ThemeToggle() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");
    let label = move || {
        if ctx.global.with(|g| g.is_dark_mode) {
            "Light"
        } else {
            "Dark"
        }
    };

    view! {
        <button class="theme-toggle" on:click=move |_| ctx.dispatch(GlobalAction::ToggleDarkMode)>
            {label}
        </button>
    }
}
