//! Application configuration.
//!
//! Centralizes the constants used by the REST client, the wallet session
//! manager and the persisted store. Deployment-specific values are read at
//! compile time with `option_env!`.

use alloy_primitives::Address;

// =============================================================================
// REST Backend
// =============================================================================

/// Base URL of the Basketfy REST backend.
pub const API_BASE_URL: &str = match option_env!("BASKETFY_API_URL") {
    Some(url) => url,
    None => "http://localhost:8080",
};

// =============================================================================
// Network Configuration
// =============================================================================

/// Native currency metadata sent with `wallet_addEthereumChain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// The network the wallet must be attached to before any account request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub chain_name: &'static str,
    pub rpc_url: &'static str,
    pub native_currency: NativeCurrency,
    pub block_explorer_url: &'static str,
}

impl NetworkConfig {
    /// Chain id as the `0x`-prefixed hex string EIP-1193 providers expect.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }
}

/// Hedera Testnet, the network the vault contract is deployed on.
pub const HEDERA_TESTNET: NetworkConfig = NetworkConfig {
    chain_id: 296,
    chain_name: "Hedera Testnet",
    rpc_url: "https://testnet.hashio.io/api",
    native_currency: NativeCurrency {
        name: "HBAR",
        symbol: "HBAR",
        decimals: 18,
    },
    block_explorer_url: "https://hashscan.io/testnet",
};

/// EIP-1193 / EIP-3085 provider error codes.
pub mod rpc_codes {
    /// The user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// `wallet_switchEthereumChain` target is not known to the wallet.
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
}

// =============================================================================
// Contract Configuration
// =============================================================================

/// Raw vault contract address, if configured for this build.
pub const VAULT_CONTRACT_ID: Option<&str> = option_env!("BASKETFY_VAULT_CONTRACT");

/// Parsed vault contract address.
///
/// Returns `None` when unset or unparsable; connecting then skips the
/// contract binding step.
pub fn vault_contract_address() -> Option<Address> {
    let raw = VAULT_CONTRACT_ID?;
    match raw.parse() {
        Ok(address) => Some(address),
        Err(e) => {
            log::warn!("ignoring invalid vault contract address {raw:?}: {e}");
            None
        }
    }
}

/// Decimal count of the stablecoins the vault accepts.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Delay between `eth_getTransactionReceipt` polls while waiting for mining.
pub const RECEIPT_POLL_INTERVAL_MS: u32 = 1500;

// =============================================================================
// Persistence
// =============================================================================

/// Storage keys.
pub mod storage_keys {
    /// sessionStorage key holding the last connected wallet address.
    pub const WALLET_ADDRESS: &str = "walletAddress";
    /// sessionStorage key holding the wallet kind used for that address.
    pub const WALLET_TYPE: &str = "walletType";
    /// localStorage key holding the persisted global store.
    pub const PERSIST_ROOT: &str = "persist:root";
}

/// Version written alongside the persisted global store.
pub const PERSIST_VERSION: u32 = 1;

// =============================================================================
// Display
// =============================================================================

/// Truncated address display (`0x12...7890`).
pub mod address_display {
    /// Leading characters kept.
    pub const PREFIX_LEN: usize = 4;
    /// Trailing characters kept.
    pub const SUFFIX_LEN: usize = 4;
    /// Addresses shorter than this format to the empty string.
    pub const MIN_LEN: usize = 10;
}
