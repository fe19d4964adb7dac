//! ABI of the Vaults contract and conversion to the shared vault types.
//!
//! Only the read-side view functions are declared. Absent keys travel as an
//! `OptionalVaultKey` tuple with `some = false`; denominations are right-padded
//! `bytes32` symbols.

use alloy::primitives::{Address, B256, U256};
use alloy::sol;

use fxdao_common::types::{Denomination, Vault, VaultKey, VaultsInfo};
use fxdao_engine::reader::ReaderError;

sol! {
    #[sol(rpc)]
    interface IVaults {
        struct VaultKey {
            address account;
            bytes32 denomination;
            uint256 index;
        }

        struct OptionalVaultKey {
            bool some;
            VaultKey key;
        }

        struct Vault {
            address account;
            bytes32 denomination;
            uint256 index;
            OptionalVaultKey nextKey;
            uint256 totalCollateral;
            uint256 totalDebt;
        }

        struct VaultsInfo {
            bytes32 denomination;
            OptionalVaultKey lowestKey;
            uint256 minColRate;
            uint256 minDebtCreation;
            uint256 openingColRate;
            uint256 totalCol;
            uint256 totalDebt;
            uint64 totalVaults;
        }

        function getVaultsInfo(bytes32 denomination) external view returns (VaultsInfo memory);

        /// Returns a vault with a zero account if `account` has no vault.
        function getVault(address account, bytes32 denomination) external view returns (Vault memory);

        /// Up to `total` vaults after `prevKey` (from the lowest when `prevKey.some` is false).
        function getVaults(
            OptionalVaultKey memory prevKey,
            bytes32 denomination,
            uint32 total,
            bool onlyToLiquidate
        ) external view returns (Vault[] memory);

        function calculateDepositRatio(uint256 rate, uint256 collateral, uint256 debt) external view returns (uint256);
    }
}

fn decode_denomination(raw: &B256) -> Result<Denomination, ReaderError> {
    Denomination::from_bytes32(raw)
        .ok_or_else(|| ReaderError::Decode(format!("Unknown denomination symbol {}", raw)))
}

pub fn decode_key(raw: &IVaults::VaultKey) -> Result<VaultKey, ReaderError> {
    Ok(VaultKey {
        account: raw.account,
        denomination: decode_denomination(&raw.denomination)?,
        index: raw.index,
    })
}

pub fn decode_optional_key(
    raw: &IVaults::OptionalVaultKey,
) -> Result<Option<VaultKey>, ReaderError> {
    if !raw.some {
        return Ok(None);
    }
    decode_key(&raw.key).map(Some)
}

pub fn encode_optional_key(key: Option<&VaultKey>) -> IVaults::OptionalVaultKey {
    match key {
        Some(key) => IVaults::OptionalVaultKey {
            some: true,
            key: IVaults::VaultKey {
                account: key.account,
                denomination: key.denomination.to_bytes32(),
                index: key.index,
            },
        },
        None => IVaults::OptionalVaultKey {
            some: false,
            key: IVaults::VaultKey {
                account: Address::ZERO,
                denomination: B256::ZERO,
                index: U256::ZERO,
            },
        },
    }
}

/// Decode a vault. A zero account means the contract has no such vault.
pub fn decode_vault(raw: &IVaults::Vault) -> Result<Option<Vault>, ReaderError> {
    if raw.account == Address::ZERO {
        return Ok(None);
    }

    Ok(Some(Vault {
        account: raw.account,
        denomination: decode_denomination(&raw.denomination)?,
        index: raw.index,
        next_key: decode_optional_key(&raw.nextKey)?,
        total_collateral: raw.totalCollateral,
        total_debt: raw.totalDebt,
    }))
}

pub fn decode_info(raw: &IVaults::VaultsInfo) -> Result<VaultsInfo, ReaderError> {
    Ok(VaultsInfo {
        denomination: decode_denomination(&raw.denomination)?,
        lowest_key: decode_optional_key(&raw.lowestKey)?,
        total_vaults: raw.totalVaults,
        total_collateral: raw.totalCol,
        total_debt: raw.totalDebt,
        min_collateral_rate: raw.minColRate,
        min_debt_creation: raw.minDebtCreation,
        opening_collateral_rate: raw.openingColRate,
    })
}
