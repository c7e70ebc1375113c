//! Core logic for the Basketfy client.
//!
//! This crate is target-independent: everything compiles natively so the
//! wallet session lifecycle, the REST client and the persisted store can be
//! tested without a browser. Browser bindings live next to the traits they
//! implement ([`wallet::BrowserProvider`], [`api::FetchTransport`],
//! [`utils::storage::BrowserStorage`]).
//!
//! - [`api`] - REST request helper with an explicit error taxonomy
//! - [`wallet`] - EIP-1193 wallet session manager and vault contract calls
//! - [`store`] - persisted global UI/session store
//! - [`models`] - wallet state, store state, contract read models

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod utils;
pub mod wallet;

pub use api::{ApiClient, ApiResponse, FetchTransport, HttpTransport, Method};
pub use error::{ApiError, ProviderError, StorageError, WalletError};
pub use models::{GlobalAction, GlobalState, Role, WalletKind, WalletState, WalletTransition};
pub use store::GlobalStore;
pub use wallet::{Eip1193Provider, WalletManager};
