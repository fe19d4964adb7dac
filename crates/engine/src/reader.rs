//! Read-only views of the remote contracts.
//!
//! The vault list lives in the Vaults contract and the locator only needs the
//! three `ListReader` calls. `VaultsReader` adds the contract's remaining views
//! and `SafetyPoolReader` covers the safety pool. Retry and endpoint selection
//! belong to the implementation; callers see a single result per call.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use thiserror::Error;

use fxdao_common::error::AppError;
use fxdao_common::types::{
    Denomination, SafetyPoolDeposit, SafetyPoolState, SafetyPoolStats, Vault, VaultKey,
    VaultsInfo,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    /// Transport failure: the remote could not be reached or did not answer.
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    /// The remote executed the read and rejected it.
    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote answered with data that does not describe a vault list.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<ReaderError> for AppError {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::Unavailable(msg) => AppError::Rpc(msg),
            ReaderError::Simulation(msg) => AppError::Simulation(msg),
            ReaderError::NotFound(msg) => AppError::NotFound(msg),
            ReaderError::Decode(msg) => AppError::Decode(msg),
        }
    }
}

/// Collaborator that reads the remote vault list.
#[async_trait]
pub trait ListReader: Send + Sync {
    /// List metadata for a currency, including the lowest key.
    async fn get_head(&self, denomination: Denomination) -> Result<VaultsInfo, ReaderError>;

    /// A single vault. Fails with `NotFound` if the account has no vault.
    async fn get_node(
        &self,
        account: Address,
        denomination: Denomination,
    ) -> Result<Vault, ReaderError>;

    /// Up to `page_size` vaults strictly after `after_key` (from the head when
    /// `None`), in ascending list order. A short page means end of list.
    async fn get_page(
        &self,
        after_key: Option<&VaultKey>,
        denomination: Denomination,
        page_size: u32,
    ) -> Result<Vec<Vault>, ReaderError>;
}

/// Full read surface of the Vaults contract.
#[async_trait]
pub trait VaultsReader: ListReader {
    /// Up to `total` vaults after `prev_key`. With `only_to_liquidate` the
    /// listing stops at the first vault that is not below the minimum
    /// collateral rate.
    async fn get_vaults(
        &self,
        prev_key: Option<&VaultKey>,
        denomination: Denomination,
        total: u32,
        only_to_liquidate: bool,
    ) -> Result<Vec<Vault>, ReaderError>;

    /// Collateral ratio the contract assigns to `collateral` against `debt`
    /// at currency `rate`.
    async fn calculate_deposit_ratio(
        &self,
        rate: U256,
        collateral: U256,
        debt: U256,
    ) -> Result<U256, ReaderError>;
}

#[async_trait]
pub trait SafetyPoolReader: Send + Sync {
    async fn get_core_state(&self) -> Result<SafetyPoolState, ReaderError>;

    async fn get_core_stats(&self) -> Result<SafetyPoolStats, ReaderError>;

    /// Fails with `NotFound` if `depositor` has no deposit.
    async fn get_deposit(&self, depositor: Address) -> Result<SafetyPoolDeposit, ReaderError>;
}
