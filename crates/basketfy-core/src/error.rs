//! Error types for each domain.
//!
//! - [`ApiError`] - REST backend requests (HTTP vs network vs decode)
//! - [`ProviderError`] - raw EIP-1193 provider RPC failures
//! - [`WalletError`] - wallet session and contract call failures
//! - [`StorageError`] - Web Storage access for persisted state

use serde_json::Value;
use thiserror::Error;

use crate::api::Method;
use crate::config::rpc_codes;
use crate::models::WalletKind;

/// Transport-level failure: the request never produced an HTTP response
/// (DNS, CORS, connection reset, browser timeout).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// REST request errors.
///
/// Callers branch on the variant to decide whether retrying makes sense:
/// an [`ApiError::Http`] means the server answered, an
/// [`ApiError::Network`] means it could not be reached.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Server reachable, non-2xx status.
    #[error("API request failed: {message}")]
    Http {
        status: u16,
        status_text: String,
        /// Server-supplied `message`/`error` field, else the status line.
        message: String,
        url: String,
        method: Method,
        /// Structured error body, or the raw body text when it was not JSON.
        payload: Option<ErrorPayload>,
    },
    /// Server unreachable or the transport failed.
    #[error("Network error: {source}")]
    Network {
        url: String,
        method: Method,
        #[source]
        source: TransportError,
    },
    /// 2xx response that declared JSON but did not parse.
    #[error("invalid JSON from {method} {url}: {source}")]
    Decode {
        url: String,
        method: Method,
        #[source]
        source: serde_json::Error,
    },
}

/// Body of a failed HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    Json(Value),
    Text(String),
}

impl ApiError {
    /// HTTP status, present only for [`ApiError::Http`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Whether repeating the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Http { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::Decode { .. } => false,
        }
    }

    /// Human-readable message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            Self::Network { source, .. } => source.to_string(),
            Self::Decode { source, .. } => source.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Http { url, .. } | Self::Network { url, .. } | Self::Decode { url, .. } => url,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::Http { method, .. } | Self::Network { method, .. } | Self::Decode { method, .. } => {
                *method
            }
        }
    }
}

/// EIP-1193 RPC error as returned by an injected provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Internal error (-32603) wrapping a failure that carried no RPC code.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(-32603, message)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == rpc_codes::UNRECOGNIZED_CHAIN
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == rpc_codes::USER_REJECTED
    }
}

/// Wallet session and contract call errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No injected provider matches the requested wallet
    #[error("{0} not found. Please install the {0} extension.")]
    NotFound(WalletKind),
    /// Another connect sequence is still in flight
    #[error("A wallet connection is already in progress")]
    ConnectInProgress,
    /// Silent restore found no already-authorized account
    #[error("{0} not connected. Please connect manually first.")]
    NotAuthorized(WalletKind),
    /// Provider returned an empty account list after authorization
    #[error("No account returned from wallet")]
    NoAccount,
    /// An address (account, feeder, token) failed to parse
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    /// Chain switch failed with anything other than "unrecognized chain"
    #[error("Failed to switch network: {0}")]
    SwitchChain(ProviderError),
    /// Adding the required chain to the wallet failed
    #[error("Failed to add network: {0}")]
    AddChain(ProviderError),
    /// Provider rejected or failed a request
    #[error("{0}")]
    Provider(ProviderError),
    /// Write call without a bound signer
    #[error("Wallet not connected")]
    NotConnected,
    /// Read call without any contract binding
    #[error("Vault contract not available")]
    ContractUnavailable,
    /// Human-decimal amount could not be converted
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    /// Required call parameter missing
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),
    /// Transaction was mined but reverted
    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },
    /// Provider answered with a payload that could not be decoded
    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}

impl From<ProviderError> for WalletError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

/// Web Storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Storage area not available (no window, privacy mode).
    #[error("storage not available")]
    Unavailable,
    /// Failed to serialize a value.
    #[error("failed to serialize value: {0}")]
    Serialization(String),
    /// Failed to write to storage.
    #[error("failed to write to storage")]
    WriteFailed,
    /// Failed to remove from storage.
    #[error("failed to remove from storage")]
    RemoveFailed,
}
