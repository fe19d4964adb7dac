//! In-memory readers over fixed snapshots.
//!
//! `MemoryListReader` serves vault pages with the same semantics as the Vaults
//! contract and counts every call, which makes it the fixture for locator,
//! planner and route tests. `MemorySafetyPool` does the same for the safety pool.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use fxdao_common::types::{
    Denomination, SafetyPoolDeposit, SafetyPoolState, SafetyPoolStats, Vault, VaultKey,
    VaultsInfo,
};

use crate::index::compute_deposit_ratio;
use crate::reader::{ListReader, ReaderError, SafetyPoolReader, VaultsReader};

#[derive(Debug, Default)]
pub struct MemoryListReader {
    lists: HashMap<Denomination, Vec<Vault>>,
    /// Currency rate and minimum collateral rate per denomination.
    rates: HashMap<Denomination, (U256, U256)>,
    /// Fail every `get_page` call after this many successful ones.
    page_failure_after: Option<usize>,
    head_requests: AtomicUsize,
    node_requests: AtomicUsize,
    page_requests: AtomicUsize,
}

impl MemoryListReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the list for `denomination`.
    ///
    /// `vaults` is taken in list order (ties keep the given order); `next_key`
    /// pointers and denominations are rewritten to match.
    pub fn with_vaults(mut self, denomination: Denomination, vaults: Vec<Vault>) -> Self {
        self.lists.insert(denomination, link(denomination, vaults));
        self
    }

    /// Set the currency rate and the minimum collateral rate for `denomination`.
    /// Without them no vault is a liquidation candidate.
    pub fn with_rates(
        mut self,
        denomination: Denomination,
        rate: U256,
        min_collateral_rate: U256,
    ) -> Self {
        self.rates.insert(denomination, (rate, min_collateral_rate));
        self
    }

    /// Make `get_page` fail with `Unavailable` after `pages` successful calls.
    pub fn with_page_failure_after(mut self, pages: usize) -> Self {
        self.page_failure_after = Some(pages);
        self
    }

    /// Current list for a currency, in order.
    pub fn vaults(&self, denomination: Denomination) -> &[Vault] {
        self.lists
            .get(&denomination)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn head_requests(&self) -> usize {
        self.head_requests.load(Ordering::Relaxed)
    }

    pub fn node_requests(&self) -> usize {
        self.node_requests.load(Ordering::Relaxed)
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::Relaxed)
    }

    /// The part of the list strictly after `after_key`.
    fn after(
        &self,
        after_key: Option<&VaultKey>,
        denomination: Denomination,
    ) -> Result<&[Vault], ReaderError> {
        let vaults = self.vaults(denomination);
        let Some(key) = after_key else {
            return Ok(vaults);
        };

        let pos = vaults
            .iter()
            .position(|v| v.is_owned_by(key.account))
            .ok_or_else(|| {
                ReaderError::NotFound(format!(
                    "Page anchor {} ({}) is not in the list",
                    key.account, denomination
                ))
            })?;
        Ok(&vaults[pos + 1..])
    }

    fn is_liquidatable(&self, vault: &Vault) -> bool {
        let Some(&(rate, min_collateral_rate)) = self.rates.get(&vault.denomination) else {
            return false;
        };
        compute_deposit_ratio(rate, vault.total_collateral, vault.total_debt)
            .is_ok_and(|ratio| ratio < min_collateral_rate)
    }
}

fn link(denomination: Denomination, mut vaults: Vec<Vault>) -> Vec<Vault> {
    for vault in vaults.iter_mut() {
        vault.denomination = denomination;
    }
    let keys: Vec<VaultKey> = vaults.iter().map(Vault::key).collect();
    for (i, vault) in vaults.iter_mut().enumerate() {
        vault.next_key = keys.get(i + 1).cloned();
    }
    vaults
}

#[async_trait]
impl ListReader for MemoryListReader {
    async fn get_head(&self, denomination: Denomination) -> Result<VaultsInfo, ReaderError> {
        self.head_requests.fetch_add(1, Ordering::Relaxed);

        let vaults = self.vaults(denomination);
        let mut info = VaultsInfo::empty(denomination);
        info.lowest_key = vaults.first().map(Vault::key);
        info.total_vaults = vaults.len() as u64;
        info.total_collateral = vaults
            .iter()
            .fold(U256::ZERO, |acc, v| acc.saturating_add(v.total_collateral));
        info.total_debt = vaults
            .iter()
            .fold(U256::ZERO, |acc, v| acc.saturating_add(v.total_debt));
        if let Some(&(_, min_collateral_rate)) = self.rates.get(&denomination) {
            info.min_collateral_rate = min_collateral_rate;
        }
        Ok(info)
    }

    async fn get_node(
        &self,
        account: Address,
        denomination: Denomination,
    ) -> Result<Vault, ReaderError> {
        self.node_requests.fetch_add(1, Ordering::Relaxed);

        self.vaults(denomination)
            .iter()
            .find(|v| v.is_owned_by(account))
            .cloned()
            .ok_or_else(|| {
                ReaderError::NotFound(format!("Vault {} ({}) not found", account, denomination))
            })
    }

    async fn get_page(
        &self,
        after_key: Option<&VaultKey>,
        denomination: Denomination,
        page_size: u32,
    ) -> Result<Vec<Vault>, ReaderError> {
        let served = self.page_requests.fetch_add(1, Ordering::Relaxed);
        if let Some(limit) = self.page_failure_after
            && served >= limit
        {
            return Err(ReaderError::Unavailable(
                "connection reset while reading vault page".to_string(),
            ));
        }

        Ok(self
            .after(after_key, denomination)?
            .iter()
            .take(page_size as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl VaultsReader for MemoryListReader {
    async fn get_vaults(
        &self,
        prev_key: Option<&VaultKey>,
        denomination: Denomination,
        total: u32,
        only_to_liquidate: bool,
    ) -> Result<Vec<Vault>, ReaderError> {
        if !only_to_liquidate {
            return self.get_page(prev_key, denomination, total).await;
        }

        Ok(self
            .after(prev_key, denomination)?
            .iter()
            .take_while(|v| self.is_liquidatable(v))
            .take(total as usize)
            .cloned()
            .collect())
    }

    async fn calculate_deposit_ratio(
        &self,
        rate: U256,
        collateral: U256,
        debt: U256,
    ) -> Result<U256, ReaderError> {
        compute_deposit_ratio(rate, collateral, debt)
            .map_err(|e| ReaderError::Simulation(e.to_string()))
    }
}

/// Safety pool snapshot.
#[derive(Debug, Clone)]
pub struct MemorySafetyPool {
    state: SafetyPoolState,
    stats: SafetyPoolStats,
    deposits: HashMap<Address, SafetyPoolDeposit>,
}

impl MemorySafetyPool {
    pub fn new(state: SafetyPoolState, stats: SafetyPoolStats) -> Self {
        Self {
            state,
            stats,
            deposits: HashMap::new(),
        }
    }

    pub fn with_deposit(mut self, deposit: SafetyPoolDeposit) -> Self {
        self.deposits.insert(deposit.depositor, deposit);
        self
    }
}

#[async_trait]
impl SafetyPoolReader for MemorySafetyPool {
    async fn get_core_state(&self) -> Result<SafetyPoolState, ReaderError> {
        Ok(self.state.clone())
    }

    async fn get_core_stats(&self) -> Result<SafetyPoolStats, ReaderError> {
        Ok(self.stats.clone())
    }

    async fn get_deposit(&self, depositor: Address) -> Result<SafetyPoolDeposit, ReaderError> {
        self.deposits
            .get(&depositor)
            .cloned()
            .ok_or_else(|| ReaderError::NotFound(format!("Deposit of {} not found", depositor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(byte: u8, index: u64) -> Vault {
        Vault {
            account: Address::repeat_byte(byte),
            denomination: Denomination::Usd,
            index: U256::from(index),
            next_key: None,
            total_collateral: U256::from(index),
            total_debt: U256::from(1_000_000_000u64),
        }
    }

    fn position(byte: u8, collateral: u64, debt: u64) -> Vault {
        Vault {
            account: Address::repeat_byte(byte),
            denomination: Denomination::Usd,
            index: U256::from(collateral * 1_000_000_000 / debt),
            next_key: None,
            total_collateral: U256::from(collateral),
            total_debt: U256::from(debt),
        }
    }

    #[test]
    fn test_links_next_keys_in_order() {
        let reader = MemoryListReader::new().with_vaults(
            Denomination::Usd,
            vec![vault(1, 100), vault(2, 200), vault(3, 300)],
        );
        let list = reader.vaults(Denomination::Usd);

        assert_eq!(list[0].next_key.as_ref().unwrap().account, Address::repeat_byte(2));
        assert_eq!(list[1].next_key.as_ref().unwrap().index, U256::from(300u64));
        assert!(list[2].next_key.is_none());
    }

    #[tokio::test]
    async fn test_pages_follow_anchor() {
        let reader = MemoryListReader::new().with_vaults(
            Denomination::Usd,
            vec![vault(1, 100), vault(2, 200), vault(3, 300)],
        );

        let first = reader.get_page(None, Denomination::Usd, 2).await.unwrap();
        assert_eq!(first.len(), 2);

        let rest = reader
            .get_page(Some(&first[1].key()), Denomination::Usd, 2)
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].account, Address::repeat_byte(3));
        assert_eq!(reader.page_requests(), 2);
    }

    #[tokio::test]
    async fn test_head_of_empty_list() {
        let reader = MemoryListReader::new();
        let info = reader.get_head(Denomination::Eur).await.unwrap();
        assert!(info.lowest_key.is_none());
        assert_eq!(info.total_vaults, 0);
    }

    #[tokio::test]
    async fn test_unknown_account_not_found() {
        let reader =
            MemoryListReader::new().with_vaults(Denomination::Usd, vec![vault(1, 100)]);
        let err = reader
            .get_node(Address::repeat_byte(9), Denomination::Usd)
            .await
            .unwrap_err();
        assert!(matches!(err, ReaderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_liquidation_listing_stops_at_first_healthy_vault() {
        // Rate 1.0 at 7 decimals, minimum 1.1: ratio is collateral / debt * 1e7.
        let reader = MemoryListReader::new()
            .with_vaults(
                Denomination::Usd,
                vec![
                    position(1, 50, 100),
                    position(2, 105, 100),
                    position(3, 150, 100),
                    position(4, 90, 100),
                ],
            )
            .with_rates(
                Denomination::Usd,
                U256::from(10_000_000u64),
                U256::from(11_000_000u64),
            );

        let candidates = reader
            .get_vaults(None, Denomination::Usd, 10, true)
            .await
            .unwrap();
        let accounts: Vec<Address> = candidates.iter().map(|v| v.account).collect();
        assert_eq!(accounts, vec![Address::repeat_byte(1), Address::repeat_byte(2)]);

        let capped = reader
            .get_vaults(None, Denomination::Usd, 1, true)
            .await
            .unwrap();
        assert_eq!(capped.len(), 1);

        let rest = reader
            .get_vaults(Some(&candidates[0].key()), Denomination::Usd, 10, true)
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].account, Address::repeat_byte(2));

        let info = reader.get_head(Denomination::Usd).await.unwrap();
        assert_eq!(info.min_collateral_rate, U256::from(11_000_000u64));
    }

    #[tokio::test]
    async fn test_no_liquidation_candidates_without_rates() {
        let reader = MemoryListReader::new()
            .with_vaults(Denomination::Usd, vec![position(1, 1, 100)]);
        let candidates = reader
            .get_vaults(None, Denomination::Usd, 10, true)
            .await
            .unwrap();
        assert!(candidates.is_empty());

        let all = reader
            .get_vaults(None, Denomination::Usd, 10, false)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_deposit_ratio_zero_debt_is_rejected() {
        let reader = MemoryListReader::new();
        let err = reader
            .calculate_deposit_ratio(U256::from(1u64), U256::from(1u64), U256::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, ReaderError::Simulation(_)));
    }

    #[tokio::test]
    async fn test_page_failure_injection() {
        let reader = MemoryListReader::new()
            .with_vaults(Denomination::Usd, vec![vault(1, 100)])
            .with_page_failure_after(1);

        assert!(reader.get_page(None, Denomination::Usd, 5).await.is_ok());
        assert!(matches!(
            reader.get_page(None, Denomination::Usd, 5).await,
            Err(ReaderError::Unavailable(_))
        ));
    }
}
