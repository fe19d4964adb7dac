//! Mutation planner.
//!
//! Every contract call that opens or changes a vault must name the predecessor
//! of the vault's current position and of its new position. The planner reads
//! the vault, applies the operation to its totals, recomputes the index and runs
//! the locator for both positions.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fxdao_common::error::AppError;
use fxdao_common::types::{Denomination, UpdateVaultOperationType, VaultKey};

use crate::index::{IndexError, compute_index};
use crate::locator::{LocateRequest, PredecessorLocator};
use crate::reader::{ListReader, ReaderError};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error("Invalid operation: {0}")]
    Validation(String),
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Index(e) => e.into(),
            PlanError::Reader(e) => e.into(),
            PlanError::Validation(msg) => AppError::Validation(msg),
        }
    }
}

/// A change to an existing vault's totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount", rename_all = "snake_case")]
pub enum VaultOperation {
    IncreaseCollateral(U256),
    IncreaseDebt(U256),
    PayDebt(U256),
}

impl VaultOperation {
    pub fn kind(&self) -> UpdateVaultOperationType {
        match self {
            VaultOperation::IncreaseCollateral(_) => UpdateVaultOperationType::IncreaseCollateral,
            VaultOperation::IncreaseDebt(_) => UpdateVaultOperationType::IncreaseDebt,
            VaultOperation::PayDebt(_) => UpdateVaultOperationType::PayDebt,
        }
    }

    pub fn amount(&self) -> U256 {
        match self {
            VaultOperation::IncreaseCollateral(amount)
            | VaultOperation::IncreaseDebt(amount)
            | VaultOperation::PayDebt(amount) => *amount,
        }
    }

    /// New `(collateral, debt)` after applying the operation.
    fn apply(&self, collateral: U256, debt: U256) -> Result<(U256, U256), PlanError> {
        match *self {
            VaultOperation::IncreaseCollateral(amount) => {
                let collateral = collateral.checked_add(amount).ok_or_else(|| {
                    PlanError::Validation("Collateral total would overflow".to_string())
                })?;
                Ok((collateral, debt))
            }
            VaultOperation::IncreaseDebt(amount) => {
                let debt = debt.checked_add(amount).ok_or_else(|| {
                    PlanError::Validation("Debt total would overflow".to_string())
                })?;
                Ok((collateral, debt))
            }
            VaultOperation::PayDebt(amount) => {
                let debt = debt.checked_sub(amount).ok_or_else(|| {
                    PlanError::Validation(format!(
                        "Cannot pay {} against a debt of {}",
                        amount, debt
                    ))
                })?;
                Ok((collateral, debt))
            }
        }
    }
}

/// Arguments for opening a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVaultPlan {
    pub account: Address,
    pub denomination: Denomination,
    pub collateral: U256,
    pub debt: U256,
    pub index: U256,
    pub prev_key: Option<VaultKey>,
    pub prepared_at: DateTime<Utc>,
}

/// Arguments for changing an existing vault.
///
/// `new_index` and `new_prev_key` are `None` when the operation pays off the
/// whole debt and the vault leaves the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateVaultPlan {
    pub operation: VaultOperation,
    pub account: Address,
    pub denomination: Denomination,
    pub vault_key: VaultKey,
    pub prev_key: Option<VaultKey>,
    pub new_total_collateral: U256,
    pub new_total_debt: U256,
    pub new_index: Option<U256>,
    pub new_prev_key: Option<VaultKey>,
    pub prepared_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VaultPlanner {
    locator: PredecessorLocator,
}

impl VaultPlanner {
    pub fn new(locator: PredecessorLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &PredecessorLocator {
        &self.locator
    }

    pub async fn plan_new_vault<R>(
        &self,
        reader: &R,
        account: Address,
        denomination: Denomination,
        collateral: U256,
        debt: U256,
    ) -> Result<NewVaultPlan, PlanError>
    where
        R: ListReader + ?Sized,
    {
        let index = compute_index(collateral, debt)?;

        let prev_key = self
            .locator
            .locate(
                reader,
                &LocateRequest {
                    target: index,
                    account,
                    denomination,
                    exclude_self: true,
                },
            )
            .await?;

        tracing::info!(
            account = %account,
            denomination = %denomination,
            index = %index,
            prev = ?prev_key.as_ref().map(|k| k.account),
            "Prepared new vault plan"
        );

        Ok(NewVaultPlan {
            account,
            denomination,
            collateral,
            debt,
            index,
            prev_key,
            prepared_at: Utc::now(),
        })
    }

    pub async fn plan_update<R>(
        &self,
        reader: &R,
        account: Address,
        denomination: Denomination,
        operation: VaultOperation,
    ) -> Result<UpdateVaultPlan, PlanError>
    where
        R: ListReader + ?Sized,
    {
        let vault = reader.get_node(account, denomination).await?;

        let prev_key = self
            .locator
            .locate(
                reader,
                &LocateRequest {
                    target: vault.index,
                    account,
                    denomination,
                    exclude_self: false,
                },
            )
            .await?;

        let (new_total_collateral, new_total_debt) =
            operation.apply(vault.total_collateral, vault.total_debt)?;

        let (new_index, new_prev_key) = if new_total_debt.is_zero() {
            (None, None)
        } else {
            let index = compute_index(new_total_collateral, new_total_debt)?;
            let prev = self
                .locator
                .locate(
                    reader,
                    &LocateRequest {
                        target: index,
                        account,
                        denomination,
                        exclude_self: true,
                    },
                )
                .await?;
            (Some(index), prev)
        };

        tracing::info!(
            account = %account,
            denomination = %denomination,
            operation = %operation.kind(),
            index = %vault.index,
            new_index = ?new_index,
            "Prepared vault update plan"
        );

        Ok(UpdateVaultPlan {
            operation,
            account,
            denomination,
            vault_key: vault.key(),
            prev_key,
            new_total_collateral,
            new_total_debt,
            new_index,
            new_prev_key,
            prepared_at: Utc::now(),
        })
    }
}
