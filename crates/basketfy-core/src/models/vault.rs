use alloy_primitives::{TxHash, U256};
use serde::Deserialize;

/// Feeder record returned by `getFeederInfo`, converted for display.
#[derive(Clone, Debug, PartialEq)]
pub struct FeederInfo {
    pub did: String,
    /// Human-decimal stablecoin balance.
    pub stablecoin_balance: String,
    pub stablecoin_balance_raw: U256,
    /// Seconds since the Unix epoch.
    pub deposit_timestamp: u64,
    /// `YYYY-MM-DD` form of `deposit_timestamp`.
    pub deposit_date: String,
    pub yield_earned: String,
    pub yield_earned_raw: U256,
    pub verified: bool,
}

/// Subset of `eth_getTransactionReceipt` the app looks at.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub block_number: Option<String>,
    /// `0x1` on success, `0x0` on revert.
    #[serde(default)]
    pub status: Option<String>,
}

impl TxReceipt {
    pub fn succeeded(&self) -> bool {
        // Pre-Byzantium receipts carry no status; treat inclusion as success.
        self.status.as_deref().is_none_or(|s| s == "0x1")
    }
}

/// Result of a mined contract write.
#[derive(Clone, Debug, PartialEq)]
pub struct TxOutcome {
    pub tx_hash: TxHash,
    pub receipt: TxReceipt,
}
