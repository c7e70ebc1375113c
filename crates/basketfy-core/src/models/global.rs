use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{WalletState, WalletTransition};
use crate::utils::format::format_address;

/// The single active role profile, if any.
///
/// Decides which header/navigation variant the UI renders. Setting a role
/// replaces whichever role was active before.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "profile", rename_all = "lowercase")]
pub enum Role {
    #[default]
    None,
    Curator(Value),
    User(Value),
    Feeder(Value),
}

impl Role {
    pub fn is_none(&self) -> bool {
        matches!(self, Role::None)
    }
}

/// Persisted UI/session record shared by every page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalState {
    pub is_dark_mode: bool,
    pub wallet_connected: bool,
    pub wallet_address: String,
    pub formatted_address: String,
    pub wallet_name: String,
    pub role: Role,
}

impl GlobalState {
    pub fn curator_data(&self) -> Option<&Value> {
        match &self.role {
            Role::Curator(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn user_data(&self) -> Option<&Value> {
        match &self.role {
            Role::User(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn feeder_data(&self) -> Option<&Value> {
        match &self.role {
            Role::Feeder(profile) => Some(profile),
            _ => None,
        }
    }

    fn clear_wallet_fields(&mut self) {
        self.wallet_connected = false;
        self.wallet_address.clear();
        self.formatted_address.clear();
        self.wallet_name.clear();
    }

    /// Apply one action. Every mutation of the store goes through here.
    pub fn apply(&mut self, action: GlobalAction) {
        match action {
            GlobalAction::SetDarkMode(on) => self.is_dark_mode = on,
            GlobalAction::ToggleDarkMode => self.is_dark_mode = !self.is_dark_mode,
            GlobalAction::SetWalletConnected(connected) => self.wallet_connected = connected,
            GlobalAction::SetWalletAddress(address) => {
                // Empty payloads are ignored; disconnects go through ResetWallet.
                if !address.is_empty() {
                    self.formatted_address = format_address(&address);
                    self.wallet_address = address;
                    self.wallet_connected = true;
                }
            }
            GlobalAction::SetWalletName(name) => self.wallet_name = name,
            GlobalAction::SetFormattedAddress(formatted) => self.formatted_address = formatted,
            GlobalAction::SetCuratorData(profile) => self.role = Role::Curator(profile),
            GlobalAction::SetUserData(profile) => self.role = Role::User(profile),
            GlobalAction::SetFeederData(profile) => self.role = Role::Feeder(profile),
            GlobalAction::ClearCuratorData => {
                if matches!(self.role, Role::Curator(_)) {
                    self.role = Role::None;
                }
            }
            GlobalAction::ClearUserData => {
                if matches!(self.role, Role::User(_)) {
                    self.role = Role::None;
                }
            }
            GlobalAction::ClearFeederData => {
                if matches!(self.role, Role::Feeder(_)) {
                    self.role = Role::None;
                }
            }
            GlobalAction::ClearWalletSession => self.clear_wallet_fields(),
            GlobalAction::ResetWallet => {
                self.clear_wallet_fields();
                self.role = Role::None;
            }
        }
    }
}

/// Named store mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum GlobalAction {
    SetDarkMode(bool),
    ToggleDarkMode,
    SetWalletConnected(bool),
    /// Sets the address, its display form, and marks the wallet connected.
    SetWalletAddress(String),
    SetWalletName(String),
    SetFormattedAddress(String),
    SetCuratorData(Value),
    ClearCuratorData,
    SetUserData(Value),
    ClearUserData,
    SetFeederData(Value),
    ClearFeederData,
    /// Clears wallet fields, keeping the active role.
    ClearWalletSession,
    /// Clears wallet fields and the active role.
    ResetWallet,
}

impl GlobalAction {
    /// Actions mirroring a wallet transition into the store.
    ///
    /// `Connecting` leaves the store untouched so the header keeps showing
    /// the previous session until the outcome is known. Only the end of a
    /// live session drops the role profile; a failed attempt keeps it.
    pub fn mirror_wallet(change: &WalletTransition) -> Vec<GlobalAction> {
        match &change.to {
            WalletState::Connected {
                address, wallet, ..
            } => vec![
                GlobalAction::SetWalletAddress(address.clone()),
                GlobalAction::SetWalletName(wallet.display_name().to_string()),
            ],
            WalletState::Disconnected if change.ended_session() => vec![GlobalAction::ResetWallet],
            WalletState::Disconnected => vec![GlobalAction::ClearWalletSession],
            WalletState::Connecting => Vec::new(),
        }
    }
}
