//! Safety pool contract: view ABI and read client.
//!
//! Only the views are declared. Deposits, withdrawals and liquidations are
//! signed by the depositor's wallet and never pass through this client.

use std::time::Duration;

use alloy::primitives::Address;
use alloy::sol;
use async_trait::async_trait;

use fxdao_common::config::AppConfig;
use fxdao_common::types::{Denomination, SafetyPoolDeposit, SafetyPoolState, SafetyPoolStats};
use fxdao_engine::reader::{ReaderError, SafetyPoolReader};

use crate::rpc::RpcPool;

sol! {
    #[sol(rpc)]
    interface ISafetyPool {
        struct CoreState {
            address admin;
            address vaultsContract;
            address treasuryContract;
            address collateralAsset;
            address depositAsset;
            bytes32 denominationAsset;
            uint256 minDeposit;
            uint32[] treasuryShare;
            uint32[] liquidatorShare;
            address governanceToken;
        }

        struct CoreStats {
            uint256 totalDeposits;
            uint256 lifetimeDeposited;
            uint256 currentDeposited;
            uint256 lifetimeProfit;
            uint256 lifetimeLiquidated;
            uint64 liquidationIndex;
            uint256 rewardsFactor;
            uint256 totalShares;
            uint256 sharePrice;
        }

        struct Deposit {
            address depositor;
            uint256 amount;
            uint64 lastDeposit;
            uint256 shares;
            uint256 sharePricePaid;
            uint64 liquidationIndex;
        }

        function getCoreState() external view returns (CoreState memory);

        function getCoreStats() external view returns (CoreStats memory);

        /// Returns a deposit with a zero depositor if `depositor` has none.
        function getDeposit(address depositor) external view returns (Deposit memory);
    }
}

pub fn decode_state(raw: &ISafetyPool::CoreState) -> Result<SafetyPoolState, ReaderError> {
    let denomination = Denomination::from_bytes32(&raw.denominationAsset).ok_or_else(|| {
        ReaderError::Decode(format!(
            "Unknown safety pool denomination {}",
            raw.denominationAsset
        ))
    })?;

    Ok(SafetyPoolState {
        admin: raw.admin,
        vaults_contract: raw.vaultsContract,
        treasury_contract: raw.treasuryContract,
        collateral_asset: raw.collateralAsset,
        deposit_asset: raw.depositAsset,
        denomination,
        min_deposit: raw.minDeposit,
        treasury_share: raw.treasuryShare.clone(),
        liquidator_share: raw.liquidatorShare.clone(),
        governance_token: raw.governanceToken,
    })
}

pub fn decode_stats(raw: &ISafetyPool::CoreStats) -> SafetyPoolStats {
    SafetyPoolStats {
        total_deposits: raw.totalDeposits,
        lifetime_deposited: raw.lifetimeDeposited,
        current_deposited: raw.currentDeposited,
        lifetime_profit: raw.lifetimeProfit,
        lifetime_liquidated: raw.lifetimeLiquidated,
        liquidation_index: raw.liquidationIndex,
        rewards_factor: raw.rewardsFactor,
        total_shares: raw.totalShares,
        share_price: raw.sharePrice,
    }
}

/// A zero depositor means the contract holds no such deposit.
pub fn decode_deposit(raw: &ISafetyPool::Deposit) -> Option<SafetyPoolDeposit> {
    if raw.depositor == Address::ZERO {
        return None;
    }

    Some(SafetyPoolDeposit {
        depositor: raw.depositor,
        amount: raw.amount,
        last_deposit: raw.lastDeposit,
        shares: raw.shares,
        share_price_paid: raw.sharePricePaid,
        liquidation_index: raw.liquidationIndex,
    })
}

/// Read-only client for the safety pool contract.
pub struct SafetyPoolClient {
    rpc: RpcPool,
    contract: Address,
}

impl SafetyPoolClient {
    pub fn new(rpc: RpcPool, contract: Address) -> Self {
        Self { rpc, contract }
    }

    /// `None` when no safety pool address is configured.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Option<Self>> {
        let Some(contract) = config.safety_pool_contract_address else {
            tracing::info!("No safety pool contract configured");
            return Ok(None);
        };

        let rpc = RpcPool::connect(&config.rpc_urls())?.with_retries(
            config.rpc_max_retries,
            Duration::from_millis(config.rpc_retry_backoff_ms),
        );

        tracing::info!(
            contract = %contract,
            endpoints = rpc.endpoint_count(),
            "Safety pool client configured"
        );

        Ok(Some(Self::new(rpc, contract)))
    }
}

#[async_trait]
impl SafetyPoolReader for SafetyPoolClient {
    async fn get_core_state(&self) -> Result<SafetyPoolState, ReaderError> {
        let address = self.contract;
        let raw = self
            .rpc
            .call("getCoreState", |p| async move {
                ISafetyPool::new(address, p).getCoreState().call().await
            })
            .await?;

        decode_state(&raw)
    }

    async fn get_core_stats(&self) -> Result<SafetyPoolStats, ReaderError> {
        let address = self.contract;
        let raw = self
            .rpc
            .call("getCoreStats", |p| async move {
                ISafetyPool::new(address, p).getCoreStats().call().await
            })
            .await?;

        Ok(decode_stats(&raw))
    }

    async fn get_deposit(&self, depositor: Address) -> Result<SafetyPoolDeposit, ReaderError> {
        let address = self.contract;
        let raw = self
            .rpc
            .call("getDeposit", |p| async move {
                ISafetyPool::new(address, p).getDeposit(depositor).call().await
            })
            .await?;

        decode_deposit(&raw)
            .ok_or_else(|| ReaderError::NotFound(format!("Deposit of {} not found", depositor)))
    }
}
