//! Vaults contract client over JSON-RPC.
//!
//! Every read is an `eth_call` against the Vaults contract, made through the
//! shared [`RpcPool`] retry policy.

use std::time::Duration;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use fxdao_common::config::AppConfig;
use fxdao_common::types::{Denomination, Vault, VaultKey, VaultsInfo};
use fxdao_engine::reader::{ListReader, ReaderError, VaultsReader};

use crate::contract::{self, IVaults};
use crate::rpc::RpcPool;

/// Read-only client for the Vaults contract.
pub struct VaultsClient {
    rpc: RpcPool,
    contract: Address,
}

impl VaultsClient {
    pub fn new(rpc: RpcPool, contract: Address) -> Self {
        Self { rpc, contract }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let rpc = RpcPool::connect(&config.rpc_urls())?.with_retries(
            config.rpc_max_retries,
            Duration::from_millis(config.rpc_retry_backoff_ms),
        );

        tracing::info!(
            contract = %config.vaults_contract_address,
            endpoints = rpc.endpoint_count(),
            max_retries = rpc.max_retries(),
            "Vaults client configured"
        );

        Ok(Self::new(rpc, config.vaults_contract_address))
    }
}

#[async_trait]
impl ListReader for VaultsClient {
    async fn get_head(&self, denomination: Denomination) -> Result<VaultsInfo, ReaderError> {
        let address = self.contract;
        let symbol = denomination.to_bytes32();
        let raw = self
            .rpc
            .call("getVaultsInfo", |p| async move {
                IVaults::new(address, p).getVaultsInfo(symbol).call().await
            })
            .await?;

        contract::decode_info(&raw)
    }

    async fn get_node(
        &self,
        account: Address,
        denomination: Denomination,
    ) -> Result<Vault, ReaderError> {
        let address = self.contract;
        let symbol = denomination.to_bytes32();
        let raw = self
            .rpc
            .call("getVault", |p| async move {
                IVaults::new(address, p).getVault(account, symbol).call().await
            })
            .await?;

        contract::decode_vault(&raw)?.ok_or_else(|| {
            ReaderError::NotFound(format!("Vault {} ({}) not found", account, denomination))
        })
    }

    async fn get_page(
        &self,
        after_key: Option<&VaultKey>,
        denomination: Denomination,
        page_size: u32,
    ) -> Result<Vec<Vault>, ReaderError> {
        self.get_vaults(after_key, denomination, page_size, false)
            .await
    }
}

#[async_trait]
impl VaultsReader for VaultsClient {
    async fn get_vaults(
        &self,
        prev_key: Option<&VaultKey>,
        denomination: Denomination,
        total: u32,
        only_to_liquidate: bool,
    ) -> Result<Vec<Vault>, ReaderError> {
        let address = self.contract;
        let prev = contract::encode_optional_key(prev_key);
        let symbol = denomination.to_bytes32();

        let raw = self
            .rpc
            .call("getVaults", |p| {
                let prev = prev.clone();
                async move {
                    IVaults::new(address, p)
                        .getVaults(prev, symbol, total, only_to_liquidate)
                        .call()
                        .await
                }
            })
            .await?;

        let mut vaults = Vec::with_capacity(raw.len());
        for item in &raw {
            match contract::decode_vault(item)? {
                Some(vault) => vaults.push(vault),
                None => {
                    return Err(ReaderError::Decode(
                        "getVaults returned an empty vault".to_string(),
                    ));
                }
            }
        }

        tracing::debug!(
            denomination = %denomination,
            requested = total,
            returned = vaults.len(),
            only_to_liquidate,
            "Fetched vaults"
        );

        Ok(vaults)
    }

    async fn calculate_deposit_ratio(
        &self,
        rate: U256,
        collateral: U256,
        debt: U256,
    ) -> Result<U256, ReaderError> {
        let address = self.contract;
        self.rpc
            .call("calculateDepositRatio", |p| async move {
                IVaults::new(address, p)
                    .calculateDepositRatio(rate, collateral, debt)
                    .call()
                    .await
            })
            .await
    }
}
