use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Currencies the Vaults contract keeps a sorted vault list for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Denomination {
    Usd,
    Eur,
}

impl Denomination {
    /// Symbol used by the contract (`"USD"`, `"EUR"`).
    pub fn symbol(&self) -> &'static str {
        match self {
            Denomination::Usd => "USD",
            Denomination::Eur => "EUR",
        }
    }

    /// Encode the symbol as a right-zero-padded `bytes32`.
    pub fn to_bytes32(&self) -> B256 {
        B256::right_padding_from(self.symbol().as_bytes())
    }

    /// Decode a right-zero-padded `bytes32` symbol.
    pub fn from_bytes32(raw: &B256) -> Option<Self> {
        let bytes = raw.as_slice();
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        // Anything after the first zero byte must be padding.
        if bytes[end..].iter().any(|b| *b != 0) {
            return None;
        }
        std::str::from_utf8(&bytes[..end]).ok()?.parse().ok()
    }
}

impl std::fmt::Display for Denomination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Denomination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Denomination::Usd),
            "EUR" => Ok(Denomination::Eur),
            other => Err(format!("Unknown denomination: {}", other)),
        }
    }
}

/// Identity of a node in the sorted vault list.
///
/// `account` + `denomination` is the real primary key. `index` is a cached copy
/// of the node's sort key and may lag behind the node during an in-flight update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultKey {
    pub account: Address,
    pub denomination: Denomination,
    pub index: U256,
}

/// A collateral/debt position, as last read from the remote list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub account: Address,
    pub denomination: Denomination,
    pub index: U256,
    /// `None` for the tail of the list.
    pub next_key: Option<VaultKey>,
    pub total_collateral: U256,
    pub total_debt: U256,
}

impl Vault {
    pub fn key(&self) -> VaultKey {
        VaultKey {
            account: self.account,
            denomination: self.denomination,
            index: self.index,
        }
    }

    pub fn is_owned_by(&self, account: Address) -> bool {
        self.account == account
    }
}

/// Per-currency list metadata (the list head).
///
/// `lowest_key` is `None` iff the list is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultsInfo {
    pub denomination: Denomination,
    pub lowest_key: Option<VaultKey>,
    pub total_vaults: u64,
    pub total_collateral: U256,
    pub total_debt: U256,
    pub min_collateral_rate: U256,
    pub min_debt_creation: U256,
    pub opening_collateral_rate: U256,
}

impl VaultsInfo {
    /// Metadata for a currency with no open vaults.
    pub fn empty(denomination: Denomination) -> Self {
        Self {
            denomination,
            lowest_key: None,
            total_vaults: 0,
            total_collateral: U256::ZERO,
            total_debt: U256::ZERO,
            min_collateral_rate: U256::ZERO,
            min_debt_creation: U256::ZERO,
            opening_collateral_rate: U256::ZERO,
        }
    }
}

/// Contract methods that change a vault's totals and therefore its list position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateVaultOperationType {
    IncreaseCollateral,
    IncreaseDebt,
    PayDebt,
}

impl std::fmt::Display for UpdateVaultOperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateVaultOperationType::IncreaseCollateral => write!(f, "increase_collateral"),
            UpdateVaultOperationType::IncreaseDebt => write!(f, "increase_debt"),
            UpdateVaultOperationType::PayDebt => write!(f, "pay_debt"),
        }
    }
}

/// Static configuration of the safety pool contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPoolState {
    pub admin: Address,
    pub vaults_contract: Address,
    pub treasury_contract: Address,
    pub collateral_asset: Address,
    pub deposit_asset: Address,
    /// Currency of the vault list the pool covers.
    pub denomination: Denomination,
    pub min_deposit: U256,
    pub treasury_share: Vec<u32>,
    pub liquidator_share: Vec<u32>,
    pub governance_token: Address,
}

/// Running totals of the safety pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPoolStats {
    pub total_deposits: U256,
    pub lifetime_deposited: U256,
    pub current_deposited: U256,
    pub lifetime_profit: U256,
    pub lifetime_liquidated: U256,
    /// Number of liquidations the pool has taken part in.
    pub liquidation_index: u64,
    pub rewards_factor: U256,
    pub total_shares: U256,
    pub share_price: U256,
}

/// One depositor's position in the safety pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPoolDeposit {
    pub depositor: Address,
    pub amount: U256,
    /// Unix timestamp (seconds) of the latest deposit.
    pub last_deposit: u64,
    pub shares: U256,
    pub share_price_paid: U256,
    pub liquidation_index: u64,
}
