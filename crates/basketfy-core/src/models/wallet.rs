use std::fmt;
use std::str::FromStr;

use crate::utils::format::format_address;

/// Wallet extensions the app knows how to talk to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WalletKind {
    #[default]
    MetaMask,
    HashPack,
}

impl WalletKind {
    /// Identifier persisted in sessionStorage.
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::MetaMask => "metamask",
            WalletKind::HashPack => "hashpack",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WalletKind::MetaMask => "MetaMask",
            WalletKind::HashPack => "HashPack",
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for WalletKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "metamask" => Ok(WalletKind::MetaMask),
            "hashpack" => Ok(WalletKind::HashPack),
            other => Err(format!("unsupported wallet type: {other}")),
        }
    }
}

/// Wallet connection state as seen by the UI.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum WalletState {
    #[default]
    Disconnected,
    Connecting,
    Connected {
        /// Checksummed account address.
        address: String,
        /// Hex chain id the provider is attached to.
        chain_id: String,
        wallet: WalletKind,
    },
}

impl WalletState {
    /// Whether a session is live.
    pub fn is_connected(&self) -> bool {
        matches!(self, WalletState::Connected { .. })
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, WalletState::Connecting)
    }

    /// Connected address, empty when disconnected.
    pub fn address(&self) -> &str {
        match self {
            WalletState::Connected { address, .. } => address,
            _ => "",
        }
    }

    /// Hex chain id of the live session.
    pub fn chain_id(&self) -> Option<&str> {
        match self {
            WalletState::Connected { chain_id, .. } => Some(chain_id),
            _ => None,
        }
    }

    /// Label for the header wallet badge.
    pub fn display_name(&self) -> String {
        match self {
            WalletState::Connected { address, .. } => {
                let short = format_address(address);
                if short.is_empty() {
                    address.clone()
                } else {
                    short
                }
            }
            WalletState::Connecting => "Connecting...".to_string(),
            WalletState::Disconnected => "Connect Wallet".to_string(),
        }
    }
}

/// A reported state change.
#[derive(Clone, Debug, PartialEq)]
pub struct WalletTransition {
    /// Last settled state: never `Connecting`.
    pub from: WalletState,
    pub to: WalletState,
}

impl WalletTransition {
    /// Whether a live session ended (as opposed to an attempt failing).
    pub fn ended_session(&self) -> bool {
        self.from.is_connected() && !self.to.is_connected()
    }
}
