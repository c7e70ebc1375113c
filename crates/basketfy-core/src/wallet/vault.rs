//! Feeders vault contract binding.
//!
//! Calls are ABI-encoded locally and sent through the provider: reads as
//! `eth_call`, writes as `eth_sendTransaction` followed by receipt polling.

use std::rc::Rc;

use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_sol_types::{SolCall, sol};
use gloo_timers::future::TimeoutFuture;
use serde_json::{Value, json};

use super::provider::Eip1193Provider;
use crate::config::RECEIPT_POLL_INTERVAL_MS;
use crate::error::WalletError;
use crate::models::{FeederInfo, TxOutcome, TxReceipt};
use crate::utils::format::format_date_iso;
use crate::utils::units::format_amount;

sol! {
    interface IFeedersVault {
        struct FeederRecord {
            string did;
            uint256 stablecoinBalance;
            uint256 depositTimestamp;
            uint256 yieldEarned;
            bool verified;
        }

        function registerFeeder(string did, address feederAddress) external;
        function depositLiquidity(address feeder, address stablecoin, uint256 amount) external;
        function withdrawLiquidity(address feeder, address stablecoin, uint256 amount) external;
        function claimYield(address feeder) external;

        function calculateYield(address feeder) external view returns (uint256);
        function getFeederInfo(address feeder) external view returns (FeederRecord memory);
        function getTotalFeederLiquidity() external view returns (uint256);
        function yieldRate() external view returns (uint256);
        function didToAddress(string did) external view returns (address);
    }

    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Vault contract bound to a provider, and optionally to a signing account.
///
/// Without a signer the binding is read-only.
pub struct VaultContract<P> {
    provider: Rc<P>,
    address: Address,
    signer: Option<Address>,
    token_decimals: u8,
}

impl<P> Clone for VaultContract<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Rc::clone(&self.provider),
            address: self.address,
            signer: self.signer,
            token_decimals: self.token_decimals,
        }
    }
}

impl<P: Eip1193Provider> VaultContract<P> {
    pub fn new(provider: Rc<P>, address: Address, token_decimals: u8) -> Self {
        Self {
            provider,
            address,
            signer: None,
            token_decimals,
        }
    }

    pub fn with_signer(mut self, signer: Address) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn set_signer(&mut self, signer: Address) {
        self.signer = Some(signer);
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> Option<Address> {
        self.signer
    }

    // -- writes -------------------------------------------------------------

    pub async fn register_feeder(&self, did: &str, feeder: Address) -> Result<TxOutcome, WalletError> {
        let call = IFeedersVault::registerFeederCall {
            did: did.to_string(),
            feederAddress: feeder,
        };
        self.send(self.address, &call).await
    }

    /// Approve the vault to pull `amount` of `stablecoin`, then deposit it.
    pub async fn deposit_liquidity(
        &self,
        feeder: Address,
        stablecoin: Address,
        amount: U256,
    ) -> Result<TxOutcome, WalletError> {
        let approve = IERC20::approveCall {
            spender: self.address,
            amount,
        };
        let approval = self.send(stablecoin, &approve).await?;
        log::info!("approved {amount} for vault in {}", approval.tx_hash);

        let call = IFeedersVault::depositLiquidityCall {
            feeder,
            stablecoin,
            amount,
        };
        self.send(self.address, &call).await
    }

    pub async fn withdraw_liquidity(
        &self,
        feeder: Address,
        stablecoin: Address,
        amount: U256,
    ) -> Result<TxOutcome, WalletError> {
        let call = IFeedersVault::withdrawLiquidityCall {
            feeder,
            stablecoin,
            amount,
        };
        self.send(self.address, &call).await
    }

    pub async fn claim_yield(&self, feeder: Address) -> Result<TxOutcome, WalletError> {
        self.send(self.address, &IFeedersVault::claimYieldCall { feeder })
            .await
    }

    // -- reads --------------------------------------------------------------

    pub async fn calculate_yield(&self, feeder: Address) -> Result<U256, WalletError> {
        self.call(self.address, &IFeedersVault::calculateYieldCall { feeder })
            .await
    }

    pub async fn feeder_info(&self, feeder: Address) -> Result<FeederInfo, WalletError> {
        let record = self
            .call(self.address, &IFeedersVault::getFeederInfoCall { feeder })
            .await?;
        Ok(self.feeder_info_from(record))
    }

    pub async fn total_feeder_liquidity(&self) -> Result<U256, WalletError> {
        self.call(self.address, &IFeedersVault::getTotalFeederLiquidityCall {})
            .await
    }

    /// Yield rate in basis points.
    pub async fn yield_rate(&self) -> Result<U256, WalletError> {
        self.call(self.address, &IFeedersVault::yieldRateCall {}).await
    }

    pub async fn address_by_did(&self, did: &str) -> Result<Address, WalletError> {
        let call = IFeedersVault::didToAddressCall {
            did: did.to_string(),
        };
        self.call(self.address, &call).await
    }

    pub async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, WalletError> {
        self.call(token, &IERC20::balanceOfCall { account: owner })
            .await
    }

    fn feeder_info_from(&self, record: IFeedersVault::FeederRecord) -> FeederInfo {
        let deposit_timestamp = u64::try_from(record.depositTimestamp).unwrap_or(u64::MAX);
        FeederInfo {
            did: record.did,
            stablecoin_balance: format_amount(record.stablecoinBalance, self.token_decimals),
            stablecoin_balance_raw: record.stablecoinBalance,
            deposit_timestamp,
            deposit_date: format_date_iso(deposit_timestamp),
            yield_earned: format_amount(record.yieldEarned, self.token_decimals),
            yield_earned_raw: record.yieldEarned,
            verified: record.verified,
        }
    }

    // -- transport ----------------------------------------------------------

    async fn call<C: SolCall>(&self, to: Address, call: &C) -> Result<C::Return, WalletError> {
        let params = json!([
            { "to": to.to_string(), "data": encode_data(&call.abi_encode()) },
            "latest",
        ]);
        let raw = self.provider.request("eth_call", params).await?;
        let data: Bytes = serde_json::from_value(raw)
            .map_err(|e| WalletError::Decode(format!("{}: {e}", C::SIGNATURE)))?;

        C::abi_decode_returns(&data).map_err(|e| WalletError::Decode(format!("{}: {e}", C::SIGNATURE)))
    }

    async fn send<C: SolCall>(&self, to: Address, call: &C) -> Result<TxOutcome, WalletError> {
        let from = self.signer.ok_or(WalletError::NotConnected)?;
        let params = json!([{
            "from": from.to_string(),
            "to": to.to_string(),
            "data": encode_data(&call.abi_encode()),
        }]);

        log::debug!("sending {} to {to}", C::SIGNATURE);
        let raw = self.provider.request("eth_sendTransaction", params).await?;
        let tx_hash: TxHash = serde_json::from_value(raw)
            .map_err(|e| WalletError::Decode(format!("transaction hash: {e}")))?;

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.succeeded() {
            return Err(WalletError::Reverted {
                tx_hash: tx_hash.to_string(),
            });
        }
        Ok(TxOutcome { tx_hash, receipt })
    }

    /// Poll until the transaction is mined. No client-side timeout.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, WalletError> {
        loop {
            let raw = self
                .provider
                .request("eth_getTransactionReceipt", json!([tx_hash.to_string()]))
                .await?;
            if !raw.is_null() {
                return serde_json::from_value(raw)
                    .map_err(|e| WalletError::Decode(format!("receipt {tx_hash}: {e}")));
            }
            TimeoutFuture::new(RECEIPT_POLL_INTERVAL_MS).await;
        }
    }
}

fn encode_data(data: &[u8]) -> Value {
    Value::String(format!("0x{}", hex::encode(data)))
}
