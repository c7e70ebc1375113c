//! Data models shared by the wallet manager, the store and the UI.
//!
//! - [`WalletState`], [`WalletKind`], [`WalletTransition`] - wallet connection lifecycle
//! - [`GlobalState`], [`GlobalAction`], [`Role`] - persisted UI/session store
//! - [`FeederInfo`], [`TxOutcome`] - vault contract results

mod global;
mod vault;
mod wallet;

pub use global::{GlobalAction, GlobalState, Role};
pub use vault::{FeederInfo, TxOutcome, TxReceipt};
pub use wallet::{WalletKind, WalletState, WalletTransition};
