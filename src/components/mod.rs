//! UI components built with Leptos.
//!
//! - [`WalletBadge`] - connect/disconnect control showing the session
//! - [`ThemeToggle`] - dark mode switch backed by the persisted store

mod theme;
mod wallet;

pub use theme::ThemeToggle;
pub use wallet::WalletBadge;
